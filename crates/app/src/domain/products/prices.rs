//! Effective price maintenance.

use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::domain::{
    offers::PgOffersRepository,
    pricing::{PricingError, compute_effective_price},
    products::{records::ProductUuid, repository::PgProductsRepository},
    reconciliation::{DraftReason, ReconciliationError, ReconciliationMode, Reconciler},
};

/// Outcome of recomputing a product's stored effective price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PriceChange {
    pub product: ProductUuid,
    pub before: u64,
    pub after: u64,
}

impl PriceChange {
    pub(crate) const fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Re-derives effective prices from the offer that currently owns a product
/// and reconciles carts when the stored price moves.
#[derive(Debug, Clone)]
pub(crate) struct PgPriceSync {
    products: PgProductsRepository,
    offers: PgOffersRepository,
    reconciler: Reconciler,
}

impl PgPriceSync {
    #[must_use]
    pub(crate) fn new(mode: ReconciliationMode) -> Self {
        Self {
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            reconciler: Reconciler::new(mode),
        }
    }

    /// Recompute and persist `product`'s effective price.
    ///
    /// The product row is (re)locked and read inside `tx`, so callers may have
    /// changed its offer earlier in the same transaction. Soft deleted
    /// products are repriced but never reconciled; their lines already left
    /// every active cart when they were deleted.
    pub(crate) async fn reprice<E>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<PriceChange, E>
    where
        E: From<sqlx::Error> + From<PricingError> + From<ReconciliationError>,
    {
        let record = self
            .products
            .lock_product_with_deleted(tx, product)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let offer = self.offers.find_offer_for_product(tx, product).await?;

        let after = compute_effective_price(
            record.list_price,
            record.floor_price,
            offer.map(|offer| offer.terms()).as_ref(),
        )?;

        let change = PriceChange {
            product,
            before: record.effective_price,
            after,
        };

        if !change.changed() {
            return Ok(change);
        }

        self.products.set_effective_price(tx, product, after).await?;

        debug!(
            product_uuid = %product,
            before = change.before,
            after = change.after,
            "effective price changed"
        );

        if record.deleted_at.is_none() {
            self.reconciler
                .dispatch(tx, product, DraftReason::PriceChange)
                .await?;
        }

        Ok(change)
    }
}
