//! Offers Data

use crate::domain::{
    offers::{errors::OffersServiceError, records::OfferUuid},
    pricing::Discount,
    products::records::{LocalizedName, ProductUuid},
};

/// New Offer Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    pub uuid: OfferUuid,
    pub product: ProductUuid,
    pub name: Option<LocalizedName>,
    pub discount: Discount,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    pub disabled: bool,
}

/// Offer Update Data
///
/// `product` moves the offer to another product when it differs from the
/// current one; the remaining fields replace the stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferUpdate {
    pub product: Option<ProductUuid>,
    pub name: Option<LocalizedName>,
    pub discount: Discount,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    pub disabled: bool,
}

pub(crate) fn validate_terms(
    discount: &Discount,
    offer_quantity: u64,
    max_per_client: u64,
) -> Result<(), OffersServiceError> {
    discount.validate()?;

    if offer_quantity == 0 || max_per_client == 0 {
        return Err(OffersServiceError::InvalidData);
    }

    Ok(())
}

impl NewOffer {
    pub(crate) fn validate(&self) -> Result<(), OffersServiceError> {
        validate_terms(&self.discount, self.offer_quantity, self.max_per_client)
    }
}

impl OfferUpdate {
    pub(crate) fn validate(&self) -> Result<(), OffersServiceError> {
        validate_terms(&self.discount, self.offer_quantity, self.max_per_client)
    }
}
