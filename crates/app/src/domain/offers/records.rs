//! Offer Records

use jiff::Timestamp;

use crate::{
    domain::{
        pricing::{Discount, OfferTerms},
        products::records::{LocalizedName, ProductUuid},
    },
    uuids::TypedUuid,
};

/// Offer UUID
pub type OfferUuid = TypedUuid<OfferRecord>;

/// Offer Record
///
/// An offer belongs to exactly one product. `quantity_purchased` counts the
/// units sold under the offer; once it reaches `offer_quantity` the offer
/// stops discounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRecord {
    pub uuid: OfferUuid,
    pub product: ProductUuid,
    pub name: Option<LocalizedName>,
    pub discount: Discount,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    pub quantity_purchased: u64,
    pub disabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OfferRecord {
    #[must_use]
    pub const fn terms(&self) -> OfferTerms {
        OfferTerms {
            discount: self.discount,
            offer_quantity: self.offer_quantity,
            quantity_purchased: self.quantity_purchased,
            disabled: self.disabled,
        }
    }

    /// Whether the offer currently discounts its product.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.terms().is_valid()
    }

    /// Units that can still be sold at the offer price.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.offer_quantity.saturating_sub(self.quantity_purchased)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn offer(quantity_purchased: u64, disabled: bool) -> OfferRecord {
        let now = Timestamp::now();

        OfferRecord {
            uuid: OfferUuid::new(),
            product: ProductUuid::new(),
            name: None,
            discount: Discount::Percent(Decimal::new(25, 2)),
            offer_quantity: 10,
            max_per_client: 2,
            quantity_purchased,
            disabled,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn offer_with_units_left_is_valid() {
        let offer = offer(9, false);

        assert!(offer.is_valid());
        assert_eq!(offer.remaining(), 1);
    }

    #[test]
    fn exhausted_offer_is_invalid() {
        let offer = offer(12, false);

        assert!(!offer.is_valid());
        assert_eq!(offer.remaining(), 0);
    }

    #[test]
    fn disabled_offer_is_invalid() {
        assert!(!offer(0, true).is_valid());
    }
}
