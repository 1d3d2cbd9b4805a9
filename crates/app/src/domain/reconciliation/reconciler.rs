//! Move-to-draft reconciliation.

use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::domain::{
    carts::{PgActiveCartsRepository, PgDraftCartsRepository, records::DraftReason},
    products::{PgProductsRepository, records::ProductUuid},
    reconciliation::{
        ReconciliationMode,
        errors::ReconciliationError,
        records::{Dispatched, MovedToDraft},
        repository::PgReconciliationJobsRepository,
    },
};

#[derive(Debug, Clone)]
pub(crate) struct Reconciler {
    mode: ReconciliationMode,
    products: PgProductsRepository,
    active: PgActiveCartsRepository,
    drafts: PgDraftCartsRepository,
    jobs: PgReconciliationJobsRepository,
}

impl Reconciler {
    #[must_use]
    pub(crate) fn new(mode: ReconciliationMode) -> Self {
        Self {
            mode,
            products: PgProductsRepository::new(),
            active: PgActiveCartsRepository::new(),
            drafts: PgDraftCartsRepository::new(),
            jobs: PgReconciliationJobsRepository::new(),
        }
    }

    /// Schedule reconciliation for `product` inside the writer's transaction.
    ///
    /// Queued mode only inserts a job row, so the job exists exactly when the
    /// change that caused it commits.
    pub(crate) async fn dispatch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<Dispatched, ReconciliationError> {
        match self.mode {
            ReconciliationMode::Inline => self
                .move_product_to_draft_in(tx, product, reason)
                .await
                .map(Dispatched::Moved),
            ReconciliationMode::Queued => {
                let job = self.jobs.enqueue(tx, product, reason).await?;

                info!(job_uuid = %job.uuid, product_uuid = %product, %reason, "enqueued reconciliation");

                Ok(Dispatched::Enqueued(job.uuid))
            }
        }
    }

    /// Move every active-cart line for `product` into its owner's draft cart.
    ///
    /// Locks the product, then each affected active cart, then the matching
    /// draft cart. Running it twice is harmless: carts that no longer hold
    /// the line are skipped.
    pub(crate) async fn move_product_to_draft_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<MovedToDraft, ReconciliationError> {
        let record = self
            .products
            .lock_product_with_deleted(tx, product)
            .await?
            .ok_or(ReconciliationError::NotFound)?;

        let users = self.active.list_users_with_product(tx, product).await?;

        let mut moved = Vec::with_capacity(users.len());

        for user in users {
            let mut cart = self.active.lock_or_create(tx, user).await?;

            let Some(line) = cart.take_product(product)? else {
                continue;
            };

            self.active.delete_item(tx, cart.uuid, product).await?;
            self.active
                .set_total(tx, cart.uuid, cart.aggregate_total)
                .await?;

            let mut draft = self.drafts.lock_or_create(tx, user).await?;

            let item = draft.merge_moved(&record, line.quantity, reason)?;

            self.drafts.upsert_item(tx, draft.uuid, &item).await?;

            moved.push(user);
        }

        info!(
            product_uuid = %product,
            %reason,
            carts = moved.len(),
            "moved product lines to draft carts"
        );

        Ok(MovedToDraft {
            product,
            reason,
            users: moved,
        })
    }
}
