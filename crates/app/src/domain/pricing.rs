//! Pricing
//!
//! Pure price arithmetic: an effective unit price is derived from a product's
//! list price, its floor price and an optional offer. Nothing in here touches
//! storage; callers persist the result.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

/// Smallest percent discount an offer may carry (1%).
pub const MIN_PERCENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest percent discount an offer may carry (95%).
pub const MAX_PERCENT: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// Smallest fixed discount, in minor units (one whole currency unit).
pub const MIN_FIXED_AMOUNT: u64 = 100;

/// Errors raised while validating discounts or computing prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("percent discount must be between 0.01 and 0.95")]
    PercentOutOfRange,

    #[error("fixed discount must be at least {MIN_FIXED_AMOUNT} minor units")]
    FixedBelowMinimum,

    #[error("floor price is above list price")]
    FloorAboveList,

    #[error("price arithmetic overflowed")]
    Overflow,
}

/// How an offer reduces the list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Fraction of the list price taken off, e.g. `0.25` for 25% off.
    Percent(Decimal),

    /// Amount in minor units subtracted from the list price.
    Fixed(u64),
}

impl Discount {
    /// Check the discount against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::PercentOutOfRange`] or [`PricingError::FixedBelowMinimum`].
    pub fn validate(&self) -> Result<(), PricingError> {
        match *self {
            Self::Percent(value) if !(MIN_PERCENT..=MAX_PERCENT).contains(&value) => {
                Err(PricingError::PercentOutOfRange)
            }
            Self::Fixed(amount) if amount < MIN_FIXED_AMOUNT => Err(PricingError::FixedBelowMinimum),
            Self::Percent(_) | Self::Fixed(_) => Ok(()),
        }
    }

    /// Apply the discount to `list_price`, without any floor.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the decimal arithmetic cannot be represented.
    pub fn apply(&self, list_price: u64) -> Result<u64, PricingError> {
        match *self {
            Self::Percent(value) => Decimal::from(list_price)
                .checked_mul(Decimal::ONE - value)
                .ok_or(PricingError::Overflow)?
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u64()
                .ok_or(PricingError::Overflow),
            Self::Fixed(amount) => Ok(list_price.saturating_sub(amount)),
        }
    }

    #[must_use]
    pub const fn kind_as_str(&self) -> &'static str {
        match self {
            Self::Percent(_) => "percent",
            Self::Fixed(_) => "fixed",
        }
    }
}

/// The parts of an offer that affect pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferTerms {
    pub discount: Discount,
    pub offer_quantity: u64,
    pub quantity_purchased: u64,
    pub disabled: bool,
}

impl OfferTerms {
    /// An offer applies while it is enabled and has stock left.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.disabled && self.quantity_purchased < self.offer_quantity
    }
}

/// Compute the per-unit price a buyer pays right now.
///
/// Invalid offers are ignored. The result never drops below `floor_price`.
///
/// # Errors
///
/// Returns a [`PricingError`] when the offer's discount is out of range, the
/// floor is above the list price, or the arithmetic overflows.
pub fn compute_effective_price(
    list_price: u64,
    floor_price: u64,
    offer: Option<&OfferTerms>,
) -> Result<u64, PricingError> {
    if let Some(offer) = offer {
        offer.discount.validate()?;
    }

    if floor_price > list_price {
        return Err(PricingError::FloorAboveList);
    }

    let discounted = match offer.filter(|offer| offer.is_valid()) {
        Some(offer) => offer.discount.apply(list_price)?,
        None => list_price,
    };

    Ok(discounted.max(floor_price))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn terms(discount: Discount) -> OfferTerms {
        OfferTerms {
            discount,
            offer_quantity: 10,
            quantity_purchased: 0,
            disabled: false,
        }
    }

    fn percent(hundredths: i64) -> Discount {
        Discount::Percent(Decimal::new(hundredths, 2))
    }

    #[test]
    fn no_offer_returns_list_price() -> TestResult {
        assert_eq!(compute_effective_price(10_000, 4_000, None)?, 10_000);

        Ok(())
    }

    #[test]
    fn percent_offer_discounts_list_price() -> TestResult {
        let offer = terms(percent(50));

        assert_eq!(compute_effective_price(10_000, 4_000, Some(&offer))?, 5_000);

        Ok(())
    }

    #[test]
    fn percent_offer_is_clamped_to_floor() -> TestResult {
        let offer = terms(percent(90));

        assert_eq!(compute_effective_price(10_000, 4_000, Some(&offer))?, 4_000);

        Ok(())
    }

    #[test]
    fn percent_offer_rounds_half_away_from_zero() -> TestResult {
        // 999 * 0.5 = 499.5
        let offer = terms(percent(50));

        assert_eq!(compute_effective_price(999, 0, Some(&offer))?, 500);

        Ok(())
    }

    #[test]
    fn fixed_offer_subtracts_amount() -> TestResult {
        let offer = terms(Discount::Fixed(3_000));

        assert_eq!(compute_effective_price(5_000, 1_000, Some(&offer))?, 2_000);

        Ok(())
    }

    #[test]
    fn fixed_offer_larger_than_list_price_hits_floor() -> TestResult {
        let offer = terms(Discount::Fixed(9_000));

        assert_eq!(compute_effective_price(5_000, 1_000, Some(&offer))?, 1_000);
        assert_eq!(compute_effective_price(5_000, 0, Some(&offer))?, 0);

        Ok(())
    }

    #[test]
    fn exhausted_offer_is_ignored() -> TestResult {
        let offer = OfferTerms {
            quantity_purchased: 10,
            ..terms(percent(50))
        };

        assert!(!offer.is_valid(), "fully purchased offer should be invalid");
        assert_eq!(compute_effective_price(10_000, 0, Some(&offer))?, 10_000);

        Ok(())
    }

    #[test]
    fn disabled_offer_is_ignored() -> TestResult {
        let offer = OfferTerms {
            disabled: true,
            ..terms(Discount::Fixed(1_000))
        };

        assert_eq!(compute_effective_price(10_000, 0, Some(&offer))?, 10_000);

        Ok(())
    }

    #[test]
    fn percent_bounds_are_inclusive() {
        assert_eq!(percent(1).validate(), Ok(()));
        assert_eq!(percent(95).validate(), Ok(()));
        assert_eq!(percent(0).validate(), Err(PricingError::PercentOutOfRange));
        assert_eq!(percent(96).validate(), Err(PricingError::PercentOutOfRange));
        assert_eq!(
            Discount::Percent(Decimal::new(5, 3)).validate(),
            Err(PricingError::PercentOutOfRange)
        );
    }

    #[test]
    fn fixed_minimum_is_one_whole_unit() {
        assert_eq!(Discount::Fixed(100).validate(), Ok(()));
        assert_eq!(
            Discount::Fixed(99).validate(),
            Err(PricingError::FixedBelowMinimum)
        );
    }

    #[test]
    fn invalid_discount_is_rejected_even_when_offer_is_disabled() {
        let offer = OfferTerms {
            disabled: true,
            ..terms(percent(99))
        };

        assert_eq!(
            compute_effective_price(10_000, 0, Some(&offer)),
            Err(PricingError::PercentOutOfRange)
        );
    }

    #[test]
    fn floor_above_list_is_rejected() {
        assert_eq!(
            compute_effective_price(1_000, 2_000, None),
            Err(PricingError::FloorAboveList)
        );
    }

    #[test]
    fn result_never_below_floor() -> TestResult {
        for list in [0_u64, 1, 99, 100, 4_999, 10_000, 1_000_000] {
            for floor in [0_u64, list / 3, list / 2, list] {
                for discount in [percent(1), percent(33), percent(95), Discount::Fixed(100)] {
                    let price = compute_effective_price(list, floor, Some(&terms(discount)))?;

                    assert!(price >= floor, "{price} fell below floor {floor}");
                    assert!(price <= list, "{price} rose above list {list}");
                }
            }
        }

        Ok(())
    }
}
