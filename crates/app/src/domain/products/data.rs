//! Products Data

use crate::domain::products::records::{Covers, LocalizedName, ProductUuid};

/// New Product Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: LocalizedName,
    pub covers: Covers,
    pub list_price: u64,
    pub floor_price: u64,
    pub stock: u64,
}

/// Product Update Data
///
/// Replaces every mutable field; the effective price is derived, never set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    pub name: LocalizedName,
    pub covers: Covers,
    pub list_price: u64,
    pub floor_price: u64,
    pub stock: u64,
}
