//! Draft Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::to_i64,
    domain::{
        carts::records::{DraftCartRecord, DraftCartUuid, DraftLineItem, DraftReason},
        products::records::ProductUuid,
        users::records::UserUuid,
    },
};

use super::try_get_line;

const CREATE_DRAFT_CART_SQL: &str = include_str!("../sql/create_draft_cart.sql");
const GET_DRAFT_CART_SQL: &str = include_str!("../sql/get_draft_cart.sql");
const LOCK_DRAFT_CART_SQL: &str = include_str!("../sql/lock_draft_cart.sql");
const GET_DRAFT_CART_ITEMS_SQL: &str = include_str!("../sql/get_draft_cart_items.sql");
const UPSERT_DRAFT_CART_ITEM_SQL: &str = include_str!("../sql/upsert_draft_cart_item.sql");
const DELETE_DRAFT_CART_ITEM_SQL: &str = include_str!("../sql/delete_draft_cart_item.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDraftCartsRepository;

impl PgDraftCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<DraftCartRecord, sqlx::Error> {
        self.create_if_missing(tx, user).await?;

        let cart = query_as::<Postgres, DraftCartRecord>(GET_DRAFT_CART_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, cart).await
    }

    pub(crate) async fn lock_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<DraftCartRecord, sqlx::Error> {
        self.create_if_missing(tx, user).await?;

        let cart = query_as::<Postgres, DraftCartRecord>(LOCK_DRAFT_CART_SQL)
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
        query(CREATE_DRAFT_CART_SQL)
            .bind(DraftCartUuid::new().into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut cart: DraftCartRecord,
    ) -> Result<DraftCartRecord, sqlx::Error> {
        let rows = query(GET_DRAFT_CART_ITEMS_SQL)
            .bind(cart.uuid.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        for row in &rows {
            cart.items.push(try_get_draft_line(row)?);
        }

        Ok(cart)
    }

    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: DraftCartUuid,
        item: &DraftLineItem,
    ) -> Result<(), sqlx::Error> {
        let line = &item.line;

        query(UPSERT_DRAFT_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(line.product.into_uuid())
            .bind(&line.name.ar)
            .bind(&line.name.en)
            .bind(line.cover.as_deref())
            .bind(to_i64(line.quantity, "quantity")?)
            .bind(to_i64(line.unit_price, "unit_price")?)
            .bind(to_i64(line.line_total, "line_total")?)
            .bind(item.reason.map(DraftReason::as_str))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: DraftCartUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_DRAFT_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn try_get_draft_line(row: &PgRow) -> sqlx::Result<DraftLineItem> {
    let reason = row
        .try_get::<Option<String>, _>("reason")?
        .map(|reason| {
            reason.parse::<DraftReason>().map_err(|e| sqlx::Error::ColumnDecode {
                index: "reason".to_string(),
                source: Box::new(e),
            })
        })
        .transpose()?;

    Ok(DraftLineItem {
        line: try_get_line(row)?,
        reason,
    })
}

impl<'r> FromRow<'r, PgRow> for DraftCartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DraftCartUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
