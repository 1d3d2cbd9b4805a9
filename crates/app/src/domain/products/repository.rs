//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use smallvec::SmallVec;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{to_i64, try_get_u64},
    domain::{
        offers::records::OfferUuid,
        products::{
            data::{NewProduct, ProductUpdate},
            records::{LocalizedName, ProductRecord, ProductUuid},
        },
    },
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LOCK_PRODUCT_SQL: &str = include_str!("sql/lock_product.sql");
const LOCK_PRODUCT_WITH_DELETED_SQL: &str = include_str!("sql/lock_product_with_deleted.sql");
const LOCK_PRODUCTS_SQL: &str = include_str!("sql/lock_products.sql");
const SHARE_PRODUCTS_SQL: &str = include_str!("sql/share_products.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const SET_EFFECTIVE_PRICE_SQL: &str = include_str!("sql/set_effective_price.sql");
const SET_OFFER_SQL: &str = include_str!("sql/set_offer.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock a live product row for writing.
    pub(crate) async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LOCK_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock a product row for writing, even if it has been soft deleted.
    pub(crate) async fn lock_product_with_deleted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LOCK_PRODUCT_WITH_DELETED_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock several live products for writing, in uuid order.
    pub(crate) async fn lock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LOCK_PRODUCTS_SQL)
            .bind(into_uuids(products))
            .fetch_all(&mut **tx)
            .await
    }

    /// Read live products under a share lock so their prices cannot change
    /// until the transaction ends.
    pub(crate) async fn share_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(SHARE_PRODUCTS_SQL)
            .bind(into_uuids(products))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
        effective_price: u64,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name.ar)
            .bind(&product.name.en)
            .bind(product.covers.to_vec())
            .bind(to_i64(product.list_price, "list_price")?)
            .bind(to_i64(product.floor_price, "floor_price")?)
            .bind(to_i64(effective_price, "effective_price")?)
            .bind(to_i64(product.stock, "stock")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        update: &ProductUpdate,
        effective_price: u64,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(&update.name.ar)
            .bind(&update.name.en)
            .bind(update.covers.to_vec())
            .bind(to_i64(update.list_price, "list_price")?)
            .bind(to_i64(update.floor_price, "floor_price")?)
            .bind(to_i64(effective_price, "effective_price")?)
            .bind(to_i64(update.stock, "stock")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_effective_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        effective_price: u64,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(SET_EFFECTIVE_PRICE_SQL)
            .bind(product.into_uuid())
            .bind(to_i64(effective_price, "effective_price")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Rewrite the product's cached offer reference.
    pub(crate) async fn set_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        offer: Option<OfferUuid>,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(SET_OFFER_SQL)
            .bind(product.into_uuid())
            .bind(offer.map(OfferUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn into_uuids(products: &[ProductUuid]) -> Vec<Uuid> {
    products.iter().copied().map(ProductUuid::into_uuid).collect()
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: LocalizedName {
                ar: row.try_get("name_ar")?,
                en: row.try_get("name_en")?,
            },
            covers: SmallVec::from_vec(row.try_get::<Vec<String>, _>("covers")?),
            list_price: try_get_u64(row, "list_price")?,
            floor_price: try_get_u64(row, "floor_price")?,
            effective_price: try_get_u64(row, "effective_price")?,
            stock: try_get_u64(row, "stock")?,
            offer: row
                .try_get::<Option<Uuid>, _>("offer_uuid")?
                .map(OfferUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
