//! Products service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        offers::PgOffersRepository,
        pricing::compute_effective_price,
        products::{
            data::{NewProduct, ProductUpdate},
            errors::ProductsServiceError,
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        reconciliation::{DraftReason, ReconciliationMode, Reconciler},
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    products: PgProductsRepository,
    offers: PgOffersRepository,
    reconciler: Reconciler,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db, mode: ReconciliationMode) -> Self {
        Self {
            db,
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            reconciler: Reconciler::new(mode),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self.products.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let product = self.products.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, product),
        fields(product_uuid = %product.uuid),
        err
    )]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let effective_price = compute_effective_price(product.list_price, product.floor_price, None)?;

        let mut tx = self.db.begin_transaction().await?;

        let created = self
            .products
            .create_product(&mut tx, &product, effective_price)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %created.uuid, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, update),
        fields(
            product_uuid = %product,
            effective_price = tracing::field::Empty,
            reconciliation = tracing::field::Empty
        ),
        err
    )]
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.products.lock_product(&mut tx, product).await?;

        let offer = self.offers.find_offer_for_product(&mut tx, product).await?;

        let effective_price = compute_effective_price(
            update.list_price,
            update.floor_price,
            offer.map(|offer| offer.terms()).as_ref(),
        )?;

        let updated = self
            .products
            .update_product(&mut tx, product, &update, effective_price)
            .await?;

        let span = Span::current();

        span.record("effective_price", effective_price);

        let reason = if current.stock > 0 && updated.stock == 0 {
            Some(DraftReason::OutOfStock)
        } else if current.effective_price == updated.effective_price {
            None
        } else {
            Some(DraftReason::PriceChange)
        };

        if let Some(reason) = reason {
            span.record("reconciliation", tracing::field::display(reason));

            self.reconciler.dispatch(&mut tx, product, reason).await?;
        }

        tx.commit().await?;

        info!(product_uuid = %product, "updated product");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.service.delete_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.products.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        self.reconciler
            .dispatch(&mut tx, product, DraftReason::OutOfStock)
            .await?;

        tx.commit().await?;

        info!(product_uuid = %product, "deleted product");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all live products.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;

    /// Creates a product; its effective price starts at the list price.
    async fn create_product(&self, product: NewProduct)
    -> Result<ProductRecord, ProductsServiceError>;

    /// Replaces a product's details and re-derives its effective price.
    ///
    /// Carts holding the product are reconciled when the effective price
    /// changes or the product runs out of stock.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Soft deletes a product and moves it out of every active cart.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;
}
