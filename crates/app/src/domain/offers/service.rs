//! Offers service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        offers::{
            data::{NewOffer, OfferUpdate},
            errors::OffersServiceError,
            records::{OfferRecord, OfferUuid},
            repository::{OfferFields, PgOffersRepository},
        },
        products::{PgPriceSync, PgProductsRepository, records::ProductUuid},
        reconciliation::ReconciliationMode,
    },
};

#[derive(Debug, Clone)]
pub struct PgOffersService {
    db: Db,
    offers: PgOffersRepository,
    products: PgProductsRepository,
    prices: PgPriceSync,
}

impl PgOffersService {
    #[must_use]
    pub fn new(db: Db, mode: ReconciliationMode) -> Self {
        Self {
            db,
            offers: PgOffersRepository::new(),
            products: PgProductsRepository::new(),
            prices: PgPriceSync::new(mode),
        }
    }

    /// Lock an offer together with the product that currently owns it.
    ///
    /// The product is locked first, matching every other writer, and the
    /// offer is re-read afterwards to catch a concurrent move.
    async fn lock_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        let seen = self.offers.get_offer(tx, offer).await?;

        self.products
            .lock_product_with_deleted(tx, seen.product)
            .await?;

        let locked = self.offers.lock_offer(tx, offer).await?;

        if locked.product != seen.product {
            return Err(OffersServiceError::ConcurrentUpdate);
        }

        Ok(locked)
    }

    /// Move `offer` onto `target`, unlinking and repricing the product it
    /// leaves. The target is left for the caller to reprice.
    async fn relocate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
        target: ProductUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        let seen = self.offers.get_offer(tx, offer).await?;

        if seen.product == target {
            return self.lock_offer(tx, offer).await;
        }

        let locked = self
            .products
            .lock_products(tx, &[seen.product, target])
            .await?;

        if !locked
            .iter()
            .any(|product| product.uuid == target && product.deleted_at.is_none())
        {
            return Err(OffersServiceError::ProductNotFound);
        }

        let current = self.offers.lock_offer(tx, offer).await?;

        if current.product != seen.product {
            return Err(OffersServiceError::ConcurrentUpdate);
        }

        if self
            .offers
            .find_offer_for_product(tx, target)
            .await?
            .is_some()
        {
            return Err(OffersServiceError::ProductHasOffer);
        }

        let moved = self.offers.set_product(tx, offer, target).await?;

        self.products.set_offer(tx, current.product, None).await?;
        self.products.set_offer(tx, target, Some(offer)).await?;

        self.prices
            .reprice::<OffersServiceError>(tx, current.product)
            .await?;

        Ok(moved)
    }
}

#[async_trait]
impl OffersService for PgOffersService {
    async fn list_offers(&self) -> Result<Vec<OfferRecord>, OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let offers = self.offers.list_offers(&mut tx).await?;

        tx.commit().await?;

        Ok(offers)
    }

    async fn get_offer(&self, offer: OfferUuid) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let offer = self.offers.get_offer(&mut tx, offer).await?;

        tx.commit().await?;

        Ok(offer)
    }

    #[tracing::instrument(
        name = "offers.service.create_offer",
        skip(self, offer),
        fields(
            offer_uuid = %offer.uuid,
            product_uuid = %offer.product,
            effective_price = tracing::field::Empty
        ),
        err
    )]
    async fn create_offer(&self, offer: NewOffer) -> Result<OfferRecord, OffersServiceError> {
        offer.validate()?;

        let mut tx = self.db.begin_transaction().await?;

        self.products
            .lock_product(&mut tx, offer.product)
            .await
            .map_err(product_lookup_error)?;

        if self
            .offers
            .find_offer_for_product(&mut tx, offer.product)
            .await?
            .is_some()
        {
            return Err(OffersServiceError::ProductHasOffer);
        }

        let created = self.offers.create_offer(&mut tx, &offer).await?;

        self.products
            .set_offer(&mut tx, offer.product, Some(created.uuid))
            .await?;

        let change = self
            .prices
            .reprice::<OffersServiceError>(&mut tx, offer.product)
            .await?;

        tx.commit().await?;

        Span::current().record("effective_price", change.after);

        info!(offer_uuid = %created.uuid, "created offer");

        Ok(created)
    }

    #[tracing::instrument(
        name = "offers.service.change_offer_product",
        skip(self),
        fields(offer_uuid = %offer, product_uuid = %product),
        err
    )]
    async fn change_offer_product(
        &self,
        offer: OfferUuid,
        product: ProductUuid,
    ) -> Result<OfferRecord, OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let moved = self.relocate(&mut tx, offer, product).await?;

        self.prices
            .reprice::<OffersServiceError>(&mut tx, moved.product)
            .await?;

        tx.commit().await?;

        info!(offer_uuid = %offer, product_uuid = %product, "moved offer");

        Ok(moved)
    }

    #[tracing::instrument(
        name = "offers.service.update_offer",
        skip(self, update),
        fields(offer_uuid = %offer, effective_price = tracing::field::Empty),
        err
    )]
    async fn update_offer(
        &self,
        offer: OfferUuid,
        update: OfferUpdate,
    ) -> Result<OfferRecord, OffersServiceError> {
        update.validate()?;

        let mut tx = self.db.begin_transaction().await?;

        match update.product {
            Some(target) => self.relocate(&mut tx, offer, target).await?,
            None => self.lock_offer(&mut tx, offer).await?,
        };

        let updated = self
            .offers
            .update_offer(
                &mut tx,
                offer,
                OfferFields {
                    name: update.name.as_ref(),
                    discount: &update.discount,
                    offer_quantity: update.offer_quantity,
                    max_per_client: update.max_per_client,
                    disabled: update.disabled,
                },
            )
            .await?;

        let change = self
            .prices
            .reprice::<OffersServiceError>(&mut tx, updated.product)
            .await?;

        tx.commit().await?;

        Span::current().record("effective_price", change.after);

        info!(offer_uuid = %offer, "updated offer");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "offers.service.delete_offer",
        skip(self),
        fields(offer_uuid = %offer),
        err
    )]
    async fn delete_offer(&self, offer: OfferUuid) -> Result<(), OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.lock_offer(&mut tx, offer).await?;

        self.products.set_offer(&mut tx, current.product, None).await?;

        if self.offers.delete_offer(&mut tx, offer).await? == 0 {
            return Err(OffersServiceError::NotFound);
        }

        self.prices
            .reprice::<OffersServiceError>(&mut tx, current.product)
            .await?;

        tx.commit().await?;

        info!(offer_uuid = %offer, "deleted offer");

        Ok(())
    }
}

fn product_lookup_error(error: sqlx::Error) -> OffersServiceError {
    if matches!(error, sqlx::Error::RowNotFound) {
        OffersServiceError::ProductNotFound
    } else {
        error.into()
    }
}

#[automock]
#[async_trait]
pub trait OffersService: Send + Sync {
    /// Retrieves every offer.
    async fn list_offers(&self) -> Result<Vec<OfferRecord>, OffersServiceError>;

    /// Retrieve a single offer.
    async fn get_offer(&self, offer: OfferUuid) -> Result<OfferRecord, OffersServiceError>;

    /// Attaches a new offer to a product that has none and reprices it.
    async fn create_offer(&self, offer: NewOffer) -> Result<OfferRecord, OffersServiceError>;

    /// Moves an offer to another product, repricing both products.
    async fn change_offer_product(
        &self,
        offer: OfferUuid,
        product: ProductUuid,
    ) -> Result<OfferRecord, OffersServiceError>;

    /// Replaces an offer's terms, optionally moving it to another product.
    async fn update_offer(
        &self,
        offer: OfferUuid,
        update: OfferUpdate,
    ) -> Result<OfferRecord, OffersServiceError>;

    /// Deletes an offer; its product falls back to the list price.
    async fn delete_offer(&self, offer: OfferUuid) -> Result<(), OffersServiceError>;
}
