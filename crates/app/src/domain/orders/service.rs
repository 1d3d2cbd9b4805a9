//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::{Span, debug, info};

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        carts::{
            PgActiveCartsRepository,
            records::{ActiveCartRecord, CartOverflow},
        },
        offers::PgOffersRepository,
        orders::{
            errors::OrdersServiceError,
            records::{OrderFilter, OrderRecord, OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
        },
        products::{
            PgPriceSync, PgProductsRepository,
            records::{ProductRecord, ProductUuid},
        },
        reconciliation::ReconciliationMode,
    },
};

/// Passes `place_order` makes before giving up on a cart that keeps
/// gaining lines.
const PLACE_ORDER_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    carts: PgActiveCartsRepository,
    products: PgProductsRepository,
    offers: PgOffersRepository,
    prices: PgPriceSync,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, mode: ReconciliationMode) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            carts: PgActiveCartsRepository::new(),
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            prices: PgPriceSync::new(mode),
        }
    }

    /// One pass of [`OrdersService::place_order`].
    ///
    /// Products are locked ahead of the cart, so the cart is read first to
    /// learn which products to lock. A line added between that read and the
    /// cart lock has an unlocked product; the pass then rolls back and
    /// returns `None` rather than lock it out of order.
    async fn try_place_order(
        &self,
        principal: Principal,
        payment_session: Option<&str>,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let preview = self.carts.get_or_create(&mut tx, principal.user).await?;
        let locked: Vec<ProductUuid> = preview.items.iter().map(|line| line.product).collect();

        self.products.lock_products(&mut tx, &locked).await?;

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        if cart.items.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        if cart
            .items
            .iter()
            .any(|line| !locked.contains(&line.product))
        {
            return Ok(None);
        }

        let total = cart
            .items
            .iter()
            .try_fold(0_u64, |total, line| total.checked_add(line.line_total))
            .ok_or(CartOverflow)?;

        let items = std::mem::take(&mut cart.items);

        let order = self
            .orders
            .create_order(&mut tx, principal.user, items, total, payment_session)
            .await?;

        cart.clear();

        self.carts.clear_items(&mut tx, cart.uuid).await?;
        self.carts
            .set_total(&mut tx, cart.uuid, cart.aggregate_total)
            .await?;

        for line in &order.items {
            let Some(offer) = self
                .offers
                .record_purchase(&mut tx, line.product, line.quantity)
                .await?
            else {
                continue;
            };

            let change = self
                .prices
                .reprice::<OrdersServiceError>(&mut tx, line.product)
                .await?;

            if change.changed() {
                info!(
                    offer_uuid = %offer.uuid,
                    product_uuid = %line.product,
                    price = change.after,
                    "offer exhausted"
                );
            }
        }

        tx.commit().await?;

        Ok(Some(order))
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.place_order",
        skip(self, principal, payment_session),
        fields(
            user_uuid = %principal.user,
            order_uuid = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn place_order(
        &self,
        principal: Principal,
        payment_session: Option<String>,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !principal.is_consumer() {
            return Err(OrdersServiceError::Forbidden);
        }

        for attempt in 1..=PLACE_ORDER_ATTEMPTS {
            if let Some(order) = self
                .try_place_order(principal, payment_session.as_deref())
                .await?
            {
                Span::current().record("order_uuid", order.uuid.to_string());
                Span::current().record("total", order.total);

                info!(lines = order.items.len(), "placed order");

                return Ok(order);
            }

            debug!(attempt, "cart gained a line before it was locked, retrying");
        }

        Err(OrdersServiceError::ConcurrentUpdate)
    }

    async fn get_order(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        if !principal.is_staff() && order.user != principal.user {
            return Err(OrdersServiceError::NotFound);
        }

        Ok(order)
    }

    async fn list_orders(
        &self,
        principal: Principal,
        filter: OrderFilter,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let filter = if principal.is_staff() {
            filter
        } else {
            OrderFilter {
                user: Some(principal.user),
                ..filter
            }
        };

        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders.list_orders(&mut tx, &filter).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.change_order_status",
        skip(self, principal),
        fields(order_uuid = %order, %status),
        err
    )]
    async fn change_order_status(
        &self,
        principal: Principal,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !principal.is_staff() {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.set_status(&mut tx, order, status).await?;

        tx.commit().await?;

        info!("changed order status");

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.service.order_again",
        skip(self, principal),
        fields(
            user_uuid = %principal.user,
            order_uuid = %order,
            added = tracing::field::Empty
        ),
        err
    )]
    async fn order_again(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<ActiveCartRecord, OrdersServiceError> {
        if !principal.is_consumer() {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        if order.user != principal.user {
            return Err(OrdersServiceError::NotFound);
        }

        let requested: Vec<ProductUuid> = order.items.iter().map(|line| line.product).collect();

        let products: FxHashMap<ProductUuid, ProductRecord> = self
            .products
            .share_products(&mut tx, &requested)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        let mut added = 0_usize;

        for item in &order.items {
            let Some(product) = products
                .get(&item.product)
                .filter(|product| product.is_available())
            else {
                continue;
            };

            let line = cart.add_product(product, item.quantity)?;

            self.carts.upsert_item(&mut tx, cart.uuid, &line).await?;

            added += 1;
        }

        self.carts
            .set_total(&mut tx, cart.uuid, cart.aggregate_total)
            .await?;

        tx.commit().await?;

        Span::current().record("added", added);

        info!("reordered into active cart");

        Ok(cart)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Turn the caller's active cart into a confirmed order and empty the
    /// cart. Units sold under an offer count towards its quantity.
    async fn place_order(
        &self,
        principal: Principal,
        payment_session: Option<String>,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Consumers only see their own orders; anything else is `NotFound`.
    async fn get_order(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Newest first. Consumers are always limited to their own orders.
    async fn list_orders(
        &self,
        principal: Principal,
        filter: OrderFilter,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    async fn change_order_status(
        &self,
        principal: Principal,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Put the lines of a past order back into the active cart at current
    /// prices, skipping products that are gone or out of stock.
    async fn order_again(
        &self,
        principal: Principal,
        order: OrderUuid,
    ) -> Result<ActiveCartRecord, OrdersServiceError>;
}
