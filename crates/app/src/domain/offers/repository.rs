//! Offers Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{to_i64, try_get_u64},
    domain::{
        offers::{
            data::NewOffer,
            records::{OfferRecord, OfferUuid},
        },
        pricing::Discount,
        products::records::{LocalizedName, ProductUuid},
    },
};

const LIST_OFFERS_SQL: &str = include_str!("sql/list_offers.sql");
const GET_OFFER_SQL: &str = include_str!("sql/get_offer.sql");
const LOCK_OFFER_SQL: &str = include_str!("sql/lock_offer.sql");
const FIND_OFFER_FOR_PRODUCT_SQL: &str = include_str!("sql/find_offer_for_product.sql");
const CREATE_OFFER_SQL: &str = include_str!("sql/create_offer.sql");
const UPDATE_OFFER_SQL: &str = include_str!("sql/update_offer.sql");
const SET_OFFER_PRODUCT_SQL: &str = include_str!("sql/set_offer_product.sql");
const DELETE_OFFER_SQL: &str = include_str!("sql/delete_offer.sql");
const RECORD_PURCHASE_SQL: &str = include_str!("sql/record_purchase.sql");

/// Column values for a [`Discount`]: kind, percent and amount.
type DiscountColumns = (&'static str, Option<Decimal>, Option<i64>);

/// Stored offer fields that an update may replace.
pub(crate) struct OfferFields<'a> {
    pub name: Option<&'a LocalizedName>,
    pub discount: &'a Discount,
    pub offer_quantity: u64,
    pub max_per_client: u64,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOffersRepository;

impl PgOffersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(LIST_OFFERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(GET_OFFER_SQL)
            .bind(offer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(LOCK_OFFER_SQL)
            .bind(offer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// The offer row is the source of truth for which offer owns a product.
    pub(crate) async fn find_offer_for_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(FIND_OFFER_FOR_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: &NewOffer,
    ) -> Result<OfferRecord, sqlx::Error> {
        let (kind, percent, amount) = discount_columns(&offer.discount)?;

        query_as::<Postgres, OfferRecord>(CREATE_OFFER_SQL)
            .bind(offer.uuid.into_uuid())
            .bind(offer.product.into_uuid())
            .bind(offer.name.as_ref().map(|name| name.ar.as_str()))
            .bind(offer.name.as_ref().map(|name| name.en.as_str()))
            .bind(kind)
            .bind(percent)
            .bind(amount)
            .bind(to_i64(offer.offer_quantity, "offer_quantity")?)
            .bind(to_i64(offer.max_per_client, "max_per_client")?)
            .bind(offer.disabled)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
        fields: OfferFields<'_>,
    ) -> Result<OfferRecord, sqlx::Error> {
        let (kind, percent, amount) = discount_columns(fields.discount)?;

        query_as::<Postgres, OfferRecord>(UPDATE_OFFER_SQL)
            .bind(offer.into_uuid())
            .bind(fields.name.map(|name| name.ar.as_str()))
            .bind(fields.name.map(|name| name.en.as_str()))
            .bind(kind)
            .bind(percent)
            .bind(amount)
            .bind(to_i64(fields.offer_quantity, "offer_quantity")?)
            .bind(to_i64(fields.max_per_client, "max_per_client")?)
            .bind(fields.disabled)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
        product: ProductUuid,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(SET_OFFER_PRODUCT_SQL)
            .bind(offer.into_uuid())
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_OFFER_SQL)
            .bind(offer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Count `quantity` units sold against the product's offer, if it has one.
    pub(crate) async fn record_purchase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<Option<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(RECORD_PURCHASE_SQL)
            .bind(product.into_uuid())
            .bind(to_i64(quantity, "quantity_purchased")?)
            .fetch_optional(&mut **tx)
            .await
    }
}

fn discount_columns(discount: &Discount) -> Result<DiscountColumns, sqlx::Error> {
    Ok(match *discount {
        Discount::Percent(value) => (discount.kind_as_str(), Some(value), None),
        Discount::Fixed(amount) => (
            discount.kind_as_str(),
            None,
            Some(to_i64(amount, "discount_amount")?),
        ),
    })
}

fn try_get_discount(row: &PgRow) -> sqlx::Result<Discount> {
    let kind: String = row.try_get("discount_kind")?;

    match kind.as_str() {
        "percent" => row
            .try_get::<Option<Decimal>, _>("discount_percent")?
            .map(Discount::Percent)
            .ok_or_else(|| missing_column("discount_percent")),
        "fixed" => match row.try_get::<Option<i64>, _>("discount_amount")? {
            Some(_) => Ok(Discount::Fixed(try_get_u64(row, "discount_amount")?)),
            None => Err(missing_column("discount_amount")),
        },
        other => Err(sqlx::Error::ColumnDecode {
            index: "discount_kind".to_string(),
            source: format!("unknown discount kind {other:?}").into(),
        }),
    }
}

fn missing_column(col: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: "unexpected NULL for discount kind".into(),
    }
}

impl<'r> FromRow<'r, PgRow> for OfferRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let name_ar: Option<String> = row.try_get("name_ar")?;
        let name_en: Option<String> = row.try_get("name_en")?;

        Ok(Self {
            uuid: OfferUuid::from_uuid(row.try_get("uuid")?),
            product: ProductUuid::from_uuid(row.try_get::<Uuid, _>("product_uuid")?),
            name: name_ar
                .zip(name_en)
                .map(|(ar, en)| LocalizedName { ar, en }),
            discount: try_get_discount(row)?,
            offer_quantity: try_get_u64(row, "offer_quantity")?,
            max_per_client: try_get_u64(row, "max_per_client")?,
            quantity_purchased: try_get_u64(row, "quantity_purchased")?,
            disabled: row.try_get("disabled")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
