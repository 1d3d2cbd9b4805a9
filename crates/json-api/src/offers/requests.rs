//! Offer Requests

use rust_decimal::{Decimal, prelude::ToPrimitive};
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::{
    offers::{
        data::{NewOffer, OfferUpdate},
        records::OfferUuid,
    },
    pricing::Discount,
};

use crate::products::get::NameBody;

const BASIS_POINTS_SCALE: u32 = 4;

/// Discount terms.
///
/// Percent discounts are given in basis points, so `2500` takes 25% off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum DiscountBody {
    Percent { basis_points: i64 },
    Fixed { amount: u64 },
}

impl From<DiscountBody> for Discount {
    fn from(body: DiscountBody) -> Self {
        match body {
            DiscountBody::Percent { basis_points } => {
                Discount::Percent(Decimal::new(basis_points, BASIS_POINTS_SCALE))
            }
            DiscountBody::Fixed { amount } => Discount::Fixed(amount),
        }
    }
}

impl From<Discount> for DiscountBody {
    fn from(discount: Discount) -> Self {
        match discount {
            Discount::Percent(value) => DiscountBody::Percent {
                basis_points: to_basis_points(value),
            },
            Discount::Fixed(amount) => DiscountBody::Fixed { amount },
        }
    }
}

/// Whole basis points in `value`, saturating at the `i64` bounds.
fn to_basis_points(value: Decimal) -> i64 {
    let saturated = if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };

    value
        .checked_mul(Decimal::from(10_000))
        .and_then(|points| points.round().to_i64())
        .unwrap_or(saturated)
}

/// Create Offer Request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub(crate) struct CreateOfferRequest {
    pub uuid: Uuid,
    pub product: Uuid,
    #[serde(default)]
    pub name: Option<NameBody>,
    pub discount: DiscountBody,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    #[serde(default)]
    pub disabled: bool,
}

impl From<CreateOfferRequest> for NewOffer {
    fn from(request: CreateOfferRequest) -> Self {
        NewOffer {
            uuid: OfferUuid::from_uuid(request.uuid),
            product: request.product.into(),
            name: request.name.map(Into::into),
            discount: request.discount.into(),
            offer_quantity: request.offer_quantity,
            max_per_client: request.max_per_client,
            disabled: request.disabled,
        }
    }
}

/// Update Offer Request
///
/// Giving a different `product` moves the offer there.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub(crate) struct UpdateOfferRequest {
    #[serde(default)]
    pub product: Option<Uuid>,
    #[serde(default)]
    pub name: Option<NameBody>,
    pub discount: DiscountBody,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    #[serde(default)]
    pub disabled: bool,
}

impl From<UpdateOfferRequest> for OfferUpdate {
    fn from(request: UpdateOfferRequest) -> Self {
        OfferUpdate {
            product: request.product.map(Into::into),
            name: request.name.map(Into::into),
            discount: request.discount.into(),
            offer_quantity: request.offer_quantity,
            max_per_client: request.max_per_client,
            disabled: request.disabled,
        }
    }
}
