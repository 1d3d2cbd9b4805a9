//! Product Records

use jiff::Timestamp;
use smallvec::SmallVec;

use crate::{domain::offers::records::OfferUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Cover image URLs, in display order.
pub type Covers = SmallVec<[String; 4]>;

/// Bilingual display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedName {
    pub ar: String,
    pub en: String,
}

/// Product Record
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: LocalizedName,
    pub covers: Covers,
    pub list_price: u64,
    pub floor_price: u64,
    pub effective_price: u64,
    pub stock: u64,
    pub offer: Option<OfferUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl ProductRecord {
    /// The image shown on cart and order lines.
    #[must_use]
    pub fn cover(&self) -> Option<&str> {
        self.covers.first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.deleted_at.is_none() && self.stock > 0
    }
}
