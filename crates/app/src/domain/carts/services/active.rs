//! Active carts service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::{Span, info};

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            records::{ActiveCartRecord, CartItemQuantity, LineChange},
            repositories::PgActiveCartsRepository,
        },
        products::{
            PgProductsRepository,
            records::{ProductRecord, ProductUuid},
        },
    },
};

use super::{ensure_consumer, ensure_quantity};

#[derive(Debug, Clone)]
pub struct PgActiveCartsService {
    db: Db,
    carts: PgActiveCartsRepository,
    products: PgProductsRepository,
}

impl PgActiveCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgActiveCartsRepository::new(),
            products: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ActiveCartsService for PgActiveCartsService {
    async fn get_cart(&self, principal: Principal) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;

        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts.get_or_create(&mut tx, principal.user).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "active_carts.service.add_product",
        skip(self, principal),
        fields(
            user_uuid = %principal.user,
            product_uuid = %product,
            aggregate_total = tracing::field::Empty
        ),
        err
    )]
    async fn add_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let product = self
            .products
            .share_products(&mut tx, &[product])
            .await?
            .pop()
            .ok_or(CartsServiceError::NotFound)?;

        if !product.is_available() {
            return Err(CartsServiceError::OutOfStock);
        }

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        let line = cart.add_product(&product, quantity)?;

        self.carts.upsert_item(&mut tx, cart.uuid, &line).await?;
        self.carts
            .set_total(&mut tx, cart.uuid, cart.aggregate_total)
            .await?;

        tx.commit().await?;

        Span::current().record("aggregate_total", cart.aggregate_total);

        info!(quantity, "added product to active cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "active_carts.service.add_multi_product",
        skip(self, principal, items),
        fields(
            user_uuid = %principal.user,
            requested = items.len(),
            added = tracing::field::Empty
        ),
        err
    )]
    async fn add_multi_product(
        &self,
        principal: Principal,
        items: Vec<CartItemQuantity>,
    ) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;

        let mut tx = self.db.begin_transaction().await?;

        let requested: Vec<ProductUuid> = items.iter().map(|item| item.product).collect();

        let products: FxHashMap<ProductUuid, ProductRecord> = self
            .products
            .share_products(&mut tx, &requested)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        let mut added = 0_usize;

        for item in items.iter().filter(|item| item.quantity > 0) {
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

        info!("added products to active cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "active_carts.service.remove_product",
        skip(self, principal),
        fields(user_uuid = %principal.user, product_uuid = %product),
        err
    )]
    async fn remove_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        match cart.remove_product(product, quantity)? {
            LineChange::Unchanged => {}
            LineChange::Upserted(line) => {
                self.carts.upsert_item(&mut tx, cart.uuid, &line).await?;
            }
            LineChange::Removed => {
                self.carts.delete_item(&mut tx, cart.uuid, product).await?;
            }
        }

        self.carts
            .set_total(&mut tx, cart.uuid, cart.aggregate_total)
            .await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "active_carts.service.clear_cart",
        skip(self, principal),
        fields(user_uuid = %principal.user),
        err
    )]
    async fn clear_cart(&self, principal: Principal) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;

        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self.carts.lock_or_create(&mut tx, principal.user).await?;

        cart.clear();

        self.carts.clear_items(&mut tx, cart.uuid).await?;
        self.carts.set_total(&mut tx, cart.uuid, 0).await?;

        tx.commit().await?;

        info!("cleared active cart");

        Ok(cart)
    }
}

#[automock]
#[async_trait]
pub trait ActiveCartsService: Send + Sync {
    /// Retrieve the caller's active cart, creating it empty on first use.
    async fn get_cart(&self, principal: Principal) -> Result<ActiveCartRecord, CartsServiceError>;

    /// Add `quantity` units of a product at its current effective price.
    ///
    /// An existing line grows at the unit price it was created with.
    async fn add_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ActiveCartRecord, CartsServiceError>;

    /// Add several products at once. Unknown or unavailable products and
    /// zero quantities are skipped.
    async fn add_multi_product(
        &self,
        principal: Principal,
        items: Vec<CartItemQuantity>,
    ) -> Result<ActiveCartRecord, CartsServiceError>;

    /// Take `quantity` units away; the line goes once nothing is left.
    async fn remove_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ActiveCartRecord, CartsServiceError>;

    /// Remove every line.
    async fn clear_cart(&self, principal: Principal) -> Result<ActiveCartRecord, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            products::{ProductsService, data::ProductUpdate},
            users::records::Role,
        },
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn get_cart_creates_empty_cart_once() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;

        let first = ctx.active_carts.get_cart(consumer).await?;
        let second = ctx.active_carts.get_cart(consumer).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.user, consumer.user);
        assert!(first.items.is_empty());
        assert_eq!(first.aggregate_total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn staff_cannot_use_carts() -> TestResult {
        let ctx = TestContext::new().await;
        let staff = ctx.create_principal(Role::Staff).await?;

        let result = ctx.active_carts.get_cart(staff).await;

        assert!(
            matches!(result, Err(CartsServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_product_snapshots_line() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 1_250, 0).await?;

        let cart = ctx
            .active_carts
            .add_product(consumer, product.uuid, 4)
            .await?;

        let line = cart.line(product.uuid).ok_or("line missing")?;

        assert_eq!(line.unit_price, 1_250);
        assert_eq!(line.line_total, 5_000);
        assert_eq!(line.name, product.name);
        assert_eq!(line.cover.as_deref(), product.cover());
        assert_eq!(cart.aggregate_total, 5_000);

        Ok(())
    }

    #[tokio::test]
    async fn add_product_twice_merges_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 300, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 1)
            .await?;
        ctx.active_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        let cart = ctx.active_carts.get_cart(consumer).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.aggregate_total, 900);

        Ok(())
    }

    #[tokio::test]
    async fn add_zero_quantity_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 300, 0).await?;

        let result = ctx
            .active_carts
            .add_product(consumer, product.uuid, 0)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_unknown_product_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;

        let result = ctx
            .active_carts
            .add_product(consumer, ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_out_of_stock_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 300, 0).await?;

        ctx.products
            .update_product(
                product.uuid,
                ProductUpdate {
                    name: product.name.clone(),
                    covers: product.covers.clone(),
                    list_price: product.list_price,
                    floor_price: product.floor_price,
                    stock: 0,
                },
            )
            .await?;

        let result = ctx
            .active_carts
            .add_product(consumer, product.uuid, 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::OutOfStock)),
            "expected OutOfStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_multi_product_skips_unknown_and_zero() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let first = helpers::create_product(&ctx, 100, 0).await?;
        let second = helpers::create_product(&ctx, 200, 0).await?;

        let cart = ctx
            .active_carts
            .add_multi_product(
                consumer,
                vec![
                    CartItemQuantity {
                        product: first.uuid,
                        quantity: 2,
                    },
                    CartItemQuantity {
                        product: ProductUuid::new(),
                        quantity: 5,
                    },
                    CartItemQuantity {
                        product: second.uuid,
                        quantity: 0,
                    },
                    CartItemQuantity {
                        product: first.uuid,
                        quantity: 1,
                    },
                ],
            )
            .await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.aggregate_total, 300);

        let stored = ctx.active_carts.get_cart(consumer).await?;

        assert_eq!(stored.aggregate_total, 300);

        Ok(())
    }

    #[tokio::test]
    async fn remove_product_partially_then_fully() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 150, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 3)
            .await?;

        let cart = ctx
            .active_carts
            .remove_product(consumer, product.uuid, 1)
            .await?;

        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.aggregate_total, 300);

        let cart = ctx
            .active_carts
            .remove_product(consumer, product.uuid, 2)
            .await?;

        assert!(cart.items.is_empty());
        assert_eq!(cart.aggregate_total, 0);

        let stored = ctx.active_carts.get_cart(consumer).await?;

        assert!(stored.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remove_absent_product_returns_cart_unchanged() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 150, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 1)
            .await?;

        let cart = ctx
            .active_carts
            .remove_product(consumer, ProductUuid::new(), 1)
            .await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.aggregate_total, 150);

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_empties_lines_and_total() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 150, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        ctx.active_carts.clear_cart(consumer).await?;

        let cart = ctx.active_carts.get_cart(consumer).await?;

        assert!(cart.items.is_empty());
        assert_eq!(cart.aggregate_total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_keep_total_consistent() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 10, 0).await?;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let carts = ctx.active_carts.clone();
                let product = product.uuid;

                tokio::spawn(async move { carts.add_product(consumer, product, 1).await })
            })
            .collect();

        for handle in handles {
            handle.await??;
        }

        let cart = ctx.active_carts.get_cart(consumer).await?;

        assert_eq!(cart.items[0].quantity, 8);
        assert_eq!(cart.aggregate_total, 80);

        Ok(())
    }
}
