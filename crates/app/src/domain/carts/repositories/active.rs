//! Active Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{to_i64, try_get_u64},
    domain::{
        carts::records::{ActiveCartRecord, ActiveCartUuid, LineItem},
        products::records::ProductUuid,
        users::records::UserUuid,
    },
};

use super::try_get_line;

const CREATE_ACTIVE_CART_SQL: &str = include_str!("../sql/create_active_cart.sql");
const GET_ACTIVE_CART_SQL: &str = include_str!("../sql/get_active_cart.sql");
const LOCK_ACTIVE_CART_SQL: &str = include_str!("../sql/lock_active_cart.sql");
const GET_ACTIVE_CART_ITEMS_SQL: &str = include_str!("../sql/get_active_cart_items.sql");
const UPSERT_ACTIVE_CART_ITEM_SQL: &str = include_str!("../sql/upsert_active_cart_item.sql");
const DELETE_ACTIVE_CART_ITEM_SQL: &str = include_str!("../sql/delete_active_cart_item.sql");
const CLEAR_ACTIVE_CART_ITEMS_SQL: &str = include_str!("../sql/clear_active_cart_items.sql");
const SET_ACTIVE_CART_TOTAL_SQL: &str = include_str!("../sql/set_active_cart_total.sql");
const LIST_USERS_WITH_PRODUCT_SQL: &str = include_str!("../sql/list_users_with_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgActiveCartsRepository;

impl PgActiveCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Read the user's cart, creating an empty one on first use.
    pub(crate) async fn get_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<ActiveCartRecord, sqlx::Error> {
        self.create_if_missing(tx, user).await?;

        let cart = query_as::<Postgres, ActiveCartRecord>(GET_ACTIVE_CART_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, cart).await
    }

    /// Like [`Self::get_or_create`], but holds the cart's row lock until the
    /// transaction ends so concurrent writers to the same cart serialise.
    pub(crate) async fn lock_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<ActiveCartRecord, sqlx::Error> {
        self.create_if_missing(tx, user).await?;

        let cart = query_as::<Postgres, ActiveCartRecord>(LOCK_ACTIVE_CART_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, cart).await
    }

    async fn create_if_missing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ACTIVE_CART_SQL)
            .bind(ActiveCartUuid::new().into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut cart: ActiveCartRecord,
    ) -> Result<ActiveCartRecord, sqlx::Error> {
        let rows = query(GET_ACTIVE_CART_ITEMS_SQL)
            .bind(cart.uuid.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        for row in &rows {
            cart.items.push(try_get_line(row)?);
        }

        Ok(cart)
    }

    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: ActiveCartUuid,
        line: &LineItem,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_ACTIVE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(line.product.into_uuid())
            .bind(&line.name.ar)
            .bind(&line.name.en)
            .bind(line.cover.as_deref())
            .bind(to_i64(line.quantity, "quantity")?)
            .bind(to_i64(line.unit_price, "unit_price")?)
            .bind(to_i64(line.line_total, "line_total")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: ActiveCartUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ACTIVE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: ActiveCartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_ACTIVE_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn set_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: ActiveCartUuid,
        aggregate_total: u64,
    ) -> Result<(), sqlx::Error> {
        query(SET_ACTIVE_CART_TOTAL_SQL)
            .bind(cart.into_uuid())
            .bind(to_i64(aggregate_total, "aggregate_total")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Users whose active cart holds a line for `product`, in uuid order.
    pub(crate) async fn list_users_with_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<UserUuid>, sqlx::Error> {
        let users = query_scalar::<Postgres, Uuid>(LIST_USERS_WITH_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(users.into_iter().map(UserUuid::from_uuid).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for ActiveCartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ActiveCartUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            aggregate_total: try_get_u64(row, "aggregate_total")?,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
