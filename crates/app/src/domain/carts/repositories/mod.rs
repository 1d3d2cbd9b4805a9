//! Cart Repositories

use sqlx::{Row, postgres::PgRow};

use crate::{
    database::try_get_u64,
    domain::{
        carts::records::LineItem,
        products::records::{LocalizedName, ProductUuid},
    },
};

mod active;
mod draft;

pub(crate) use active::PgActiveCartsRepository;
pub(crate) use draft::PgDraftCartsRepository;

pub(crate) fn try_get_line(row: &PgRow) -> sqlx::Result<LineItem> {
    Ok(LineItem {
        product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
        name: LocalizedName {
            ar: row.try_get("name_ar")?,
            en: row.try_get("name_en")?,
        },
        cover: row.try_get("cover")?,
        quantity: try_get_u64(row, "quantity")?,
        unit_price: try_get_u64(row, "unit_price")?,
        line_total: try_get_u64(row, "line_total")?,
    })
}
