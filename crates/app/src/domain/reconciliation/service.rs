//! Reconciliation service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::records::DraftReason,
        products::records::ProductUuid,
        reconciliation::{
            ReconciliationMode,
            errors::ReconciliationError,
            reconciler::Reconciler,
            records::{MovedToDraft, QueueStats, ReconciliationJob, ReconciliationJobUuid},
            repository::PgReconciliationJobsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgReconciliationService {
    db: Db,
    reconciler: Reconciler,
    jobs: PgReconciliationJobsRepository,
}

impl PgReconciliationService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            reconciler: Reconciler::new(ReconciliationMode::Inline),
            jobs: PgReconciliationJobsRepository::new(),
        }
    }
}

#[async_trait]
impl ReconciliationService for PgReconciliationService {
    #[tracing::instrument(
        name = "reconciliation.service.move_product_to_draft",
        skip(self),
        fields(product_uuid = %product, %reason),
        err
    )]
    async fn move_product_to_draft(
        &self,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<MovedToDraft, ReconciliationError> {
        let mut tx = self.db.begin_transaction().await?;

        let moved = self
            .reconciler
            .move_product_to_draft_in(&mut tx, product, reason)
            .await?;

        tx.commit().await?;

        Ok(moved)
    }

    #[tracing::instrument(
        name = "reconciliation.service.enqueue",
        skip(self),
        fields(product_uuid = %product, %reason),
        err
    )]
    async fn enqueue(
        &self,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<ReconciliationJob, ReconciliationError> {
        let mut tx = self.db.begin_transaction().await?;

        let job = self.jobs.enqueue(&mut tx, product, reason).await?;

        tx.commit().await?;

        Ok(job)
    }

    async fn get_job(
        &self,
        job: ReconciliationJobUuid,
    ) -> Result<ReconciliationJob, ReconciliationError> {
        let mut tx = self.db.begin_transaction().await?;

        let job = self.jobs.get_job(&mut tx, job).await?;

        tx.commit().await?;

        Ok(job)
    }

    async fn queue_stats(&self) -> Result<QueueStats, ReconciliationError> {
        let mut tx = self.db.begin_transaction().await?;

        let stats = self.jobs.queue_stats(&mut tx).await?;

        tx.commit().await?;

        Ok(stats)
    }
}

#[automock]
#[async_trait]
pub trait ReconciliationService: Send + Sync {
    /// Move every active-cart line for `product` into draft carts now.
    async fn move_product_to_draft(
        &self,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<MovedToDraft, ReconciliationError>;

    /// Queue a reconciliation job for the worker.
    async fn enqueue(
        &self,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<ReconciliationJob, ReconciliationError>;

    async fn get_job(
        &self,
        job: ReconciliationJobUuid,
    ) -> Result<ReconciliationJob, ReconciliationError>;

    /// Pending and failed job counts.
    async fn queue_stats(&self) -> Result<QueueStats, ReconciliationError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::carts::{ActiveCartsService, DraftCartsService},
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn moves_lines_from_every_holder() -> TestResult {
        let ctx = TestContext::new().await;

        let alice = ctx.consumer().await?;
        let bob = ctx.consumer().await?;
        let bystander = ctx.consumer().await?;

        let product = helpers::create_product(&ctx, 500, 0).await?;
        let other = helpers::create_product(&ctx, 70, 0).await?;

        ctx.active_carts.add_product(alice, product.uuid, 2).await?;
        ctx.active_carts.add_product(alice, other.uuid, 1).await?;
        ctx.active_carts.add_product(bob, product.uuid, 1).await?;
        ctx.active_carts.add_product(bystander, other.uuid, 3).await?;

        let moved = ctx
            .reconciliation
            .move_product_to_draft(product.uuid, DraftReason::OutOfStock)
            .await?;

        let mut expected = vec![alice.user, bob.user];
        expected.sort();

        assert_eq!(moved.users, expected);

        let alice_active = ctx.active_carts.get_cart(alice).await?;

        assert_eq!(alice_active.items.len(), 1);
        assert_eq!(alice_active.aggregate_total, 70);

        let alice_draft = ctx.draft_carts.get_cart(alice).await?;
        let line = alice_draft.line(product.uuid).ok_or("draft line missing")?;

        assert_eq!(alice_draft.items.len(), 1);
        assert_eq!(line.line.quantity, 2);
        assert_eq!(line.reason, Some(DraftReason::OutOfStock));

        let bob_active = ctx.active_carts.get_cart(bob).await?;

        assert!(bob_active.items.is_empty());
        assert_eq!(bob_active.aggregate_total, 0);

        let bob_draft = ctx.draft_carts.get_cart(bob).await?;
        let line = bob_draft.line(product.uuid).ok_or("draft line missing")?;

        assert_eq!(bob_draft.items.len(), 1);
        assert_eq!(line.line.quantity, 1);
        assert_eq!(line.line.line_total, 500);
        assert_eq!(line.reason, Some(DraftReason::OutOfStock));

        let bystander_active = ctx.active_carts.get_cart(bystander).await?;

        assert_eq!(bystander_active.aggregate_total, 210);
        assert!(ctx.draft_carts.get_cart(bystander).await?.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn moving_twice_is_a_no_op() -> TestResult {
        let ctx = TestContext::new().await;

        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 500, 0).await?;

        ctx.active_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        ctx.reconciliation
            .move_product_to_draft(product.uuid, DraftReason::PriceChange)
            .await?;

        let second = ctx
            .reconciliation
            .move_product_to_draft(product.uuid, DraftReason::PriceChange)
            .await?;

        assert!(second.users.is_empty());

        let draft = ctx.draft_carts.get_cart(consumer).await?;

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].line.quantity, 2);

        Ok(())
    }

    #[tokio::test]
    async fn moved_line_merges_with_existing_draft_line() -> TestResult {
        let ctx = TestContext::new().await;

        let consumer = ctx.consumer().await?;
        let product = helpers::create_product(&ctx, 500, 0).await?;

        ctx.draft_carts
            .add_product(consumer, product.uuid, 1)
            .await?;
        ctx.active_carts
            .add_product(consumer, product.uuid, 2)
            .await?;

        ctx.reconciliation
            .move_product_to_draft(product.uuid, DraftReason::PriceChange)
            .await?;

        let draft = ctx.draft_carts.get_cart(consumer).await?;

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].line.quantity, 3);
        assert_eq!(draft.items[0].line.line_total, 1_500);
        assert_eq!(draft.items[0].reason, Some(DraftReason::PriceChange));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .reconciliation
            .move_product_to_draft(ProductUuid::new(), DraftReason::PriceChange)
            .await;

        assert!(
            matches!(result, Err(ReconciliationError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn enqueue_records_pending_job() -> TestResult {
        let ctx = TestContext::new().await;

        let product = helpers::create_product(&ctx, 500, 0).await?;

        let job = ctx
            .reconciliation
            .enqueue(product.uuid, DraftReason::OutOfStock)
            .await?;

        assert_eq!(job.product, product.uuid);
        assert_eq!(job.attempts, 0);
        assert!(job.failed_at.is_none());
        assert_eq!(ctx.reconciliation.queue_stats().await?.pending, 1);

        Ok(())
    }

    #[tokio::test]
    async fn enqueue_for_unknown_product_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .reconciliation
            .enqueue(ProductUuid::new(), DraftReason::OutOfStock)
            .await;

        assert!(
            matches!(result, Err(ReconciliationError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
