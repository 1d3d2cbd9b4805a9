//! Draft carts service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            records::{ActiveCartRecord, CartItemQuantity, DraftCartRecord, LineChange},
            repositories::{PgActiveCartsRepository, PgDraftCartsRepository},
        },
        products::{
            PgProductsRepository,
            records::{ProductRecord, ProductUuid},
        },
    },
};

use super::{ensure_consumer, ensure_quantity};

#[derive(Debug, Clone)]
pub struct PgDraftCartsService {
    db: Db,
    drafts: PgDraftCartsRepository,
    active: PgActiveCartsRepository,
    products: PgProductsRepository,
}

impl PgDraftCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            drafts: PgDraftCartsRepository::new(),
            active: PgActiveCartsRepository::new(),
            products: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl DraftCartsService for PgDraftCartsService {
    async fn get_cart(&self, principal: Principal) -> Result<DraftCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;

        let mut tx = self.db.begin_transaction().await?;

        let cart = self.drafts.get_or_create(&mut tx, principal.user).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "draft_carts.service.add_product",
        skip(self, principal),
        fields(user_uuid = %principal.user, product_uuid = %product),
        err
    )]
    async fn add_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<DraftCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let product = self
            .products
            .share_products(&mut tx, &[product])
            .await?
            .pop()
            .ok_or(CartsServiceError::NotFound)?;

        let mut cart = self.drafts.lock_or_create(&mut tx, principal.user).await?;

        let item = cart.add_product(&product, quantity)?;

        self.drafts.upsert_item(&mut tx, cart.uuid, &item).await?;

        tx.commit().await?;

        info!(quantity, "added product to draft cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "draft_carts.service.add_multi_product",
        skip(self, principal, items),
        fields(user_uuid = %principal.user, requested = items.len()),
        err
    )]
    async fn add_multi_product(
        &self,
        principal: Principal,
        items: Vec<CartItemQuantity>,
    ) -> Result<DraftCartRecord, CartsServiceError> {
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

        let mut cart = self.drafts.lock_or_create(&mut tx, principal.user).await?;

        for item in items.iter().filter(|item| item.quantity > 0) {
            let Some(product) = products.get(&item.product) else {
                continue;
            };

            let line = cart.add_product(product, item.quantity)?;

            self.drafts.upsert_item(&mut tx, cart.uuid, &line).await?;
        }

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "draft_carts.service.remove_product",
        skip(self, principal),
        fields(user_uuid = %principal.user, product_uuid = %product),
        err
    )]
    async fn remove_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<DraftCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self.drafts.lock_or_create(&mut tx, principal.user).await?;

        match cart.remove_product(product, quantity)? {
            LineChange::Unchanged => {}
            LineChange::Upserted(item) => {
                self.drafts.upsert_item(&mut tx, cart.uuid, &item).await?;
            }
            LineChange::Removed => {
                self.drafts.delete_item(&mut tx, cart.uuid, product).await?;
            }
        }

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "draft_carts.service.confirm_product",
        skip(self, principal),
        fields(user_uuid = %principal.user, product_uuid = %product),
        err
    )]
    async fn confirm_product(
        &self,
        principal: Principal,
        product: ProductUuid,
    ) -> Result<ActiveCartRecord, CartsServiceError> {
        ensure_consumer(&principal)?;

        let mut tx = self.db.begin_transaction().await?;

        let product = self
            .products
            .share_products(&mut tx, &[product])
            .await?
            .pop()
            .ok_or(CartsServiceError::NotFound)?;

        let mut active = self.active.lock_or_create(&mut tx, principal.user).await?;
        let mut draft = self.drafts.lock_or_create(&mut tx, principal.user).await?;

        let Some(item) = draft.take_product(product.uuid) else {
            tx.commit().await?;

            return Ok(active);
        };

        if !product.is_available() {
            return Err(CartsServiceError::OutOfStock);
        }

        let line = active.add_product(&product, item.line.quantity)?;

        self.drafts
            .delete_item(&mut tx, draft.uuid, product.uuid)
            .await?;
        self.active.upsert_item(&mut tx, active.uuid, &line).await?;
        self.active
            .set_total(&mut tx, active.uuid, active.aggregate_total)
            .await?;

        tx.commit().await?;

        info!(
            quantity = item.line.quantity,
            unit_price = product.effective_price,
            "confirmed draft line"
        );

        Ok(active)
    }
}

#[automock]
#[async_trait]
pub trait DraftCartsService: Send + Sync {
    /// Retrieve the caller's draft cart, creating it empty on first use.
    async fn get_cart(&self, principal: Principal) -> Result<DraftCartRecord, CartsServiceError>;

    /// Put a product in the draft cart directly; such lines carry no reason.
    async fn add_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<DraftCartRecord, CartsServiceError>;

    /// Add several products at once, skipping unknown products and zero
    /// quantities.
    async fn add_multi_product(
        &self,
        principal: Principal,
        items: Vec<CartItemQuantity>,
    ) -> Result<DraftCartRecord, CartsServiceError>;

    async fn remove_product(
        &self,
        principal: Principal,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<DraftCartRecord, CartsServiceError>;

    /// Move a draft line back into the active cart at the product's current
    /// effective price. Returns the active cart.
    async fn confirm_product(
        &self,
        principal: Principal,
        product: ProductUuid,
    ) -> Result<ActiveCartRecord, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{ActiveCartsService, records::DraftReason},
            products::{ProductsService, data::ProductUpdate},
            reconciliation::ReconciliationService,
            users::records::Role,
        },
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn direct_add_has_no_reason() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 420, 0).await?;

        let cart = ctx
            .draft_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        let item = cart.line(product.uuid).ok_or("draft line missing")?;

        assert_eq!(item.reason, None);
        assert_eq!(item.line.line_total, 840);

        Ok(())
    }

    #[tokio::test]
    async fn admin_cannot_use_drafts() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = ctx.create_principal(Role::Admin).await?;

        let result = ctx.draft_carts.get_cart(admin).await;

        assert!(
            matches!(result, Err(CartsServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_draft_line() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 100, 0).await?;

        ctx.draft_carts
            .add_product(consumer, product.uuid, 3)
            .await?;

        let cart = ctx
            .draft_carts
            .remove_product(consumer, product.uuid, 1)
            .await?;

        assert_eq!(cart.items[0].line.quantity, 2);
        assert_eq!(cart.items[0].line.line_total, 200);

        let cart = ctx
            .draft_carts
            .remove_product(consumer, product.uuid, 2)
            .await?;

        assert!(cart.items.is_empty());
        assert!(ctx.draft_carts.get_cart(consumer).await?.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn partial_removal_keeps_stored_reason() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 100, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 3)
            .await?;

        ctx.reconciliation
            .move_product_to_draft(product.uuid, DraftReason::OutOfStock)
            .await?;

        ctx.draft_carts
            .remove_product(consumer, product.uuid, 1)
            .await?;

        let cart = ctx.draft_carts.get_cart(consumer).await?;
        let item = cart.line(product.uuid).ok_or("draft line missing")?;

        assert_eq!(item.line.quantity, 2);
        assert_eq!(item.reason, Some(DraftReason::OutOfStock));

        Ok(())
    }

    #[tokio::test]
    async fn confirm_moves_line_back_at_current_price() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 1_000, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        ctx.products
            .update_product(
                product.uuid,
                ProductUpdate {
                    name: product.name.clone(),
                    covers: product.covers.clone(),
                    list_price: 1_200,
                    floor_price: 0,
                    stock: product.stock,
                },
            )
            .await?;

        let draft = ctx.draft_carts.get_cart(consumer).await?;

        assert_eq!(draft.items[0].reason, Some(DraftReason::PriceChange));

        let active = ctx
            .draft_carts
            .confirm_product(consumer, product.uuid)
            .await?;

        let line = active.line(product.uuid).ok_or("active line missing")?;

        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, 1_200);
        assert_eq!(active.aggregate_total, 2_400);
        assert!(ctx.draft_carts.get_cart(consumer).await?.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn confirm_without_draft_line_returns_active_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 1_000, 0).await?;

        let active = ctx
            .draft_carts
            .confirm_product(consumer, product.uuid)
            .await?;

        assert!(active.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn confirm_deleted_product_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 1_000, 0).await?;

        ctx.draft_carts
            .add_product(consumer, product.uuid, 1)
            .await?;

        ctx.products.delete_product(product.uuid).await?;

        let result = ctx
            .draft_carts
            .confirm_product(consumer, product.uuid)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
