//! Test Helpers

use rust_decimal::Decimal;
use smallvec::smallvec;

use crate::{
    domain::{
        offers::{
            OffersService, OffersServiceError,
            data::NewOffer,
            records::{OfferRecord, OfferUuid},
        },
        pricing::Discount,
        products::{
            ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{LocalizedName, ProductRecord, ProductUuid},
        },
        reconciliation::{ReconciliationError, ReconciliationService},
    },
    test::TestContext,
};

pub(crate) fn new_product(uuid: ProductUuid, list_price: u64, floor_price: u64) -> NewProduct {
    NewProduct {
        uuid,
        name: LocalizedName {
            ar: "قهوة".to_string(),
            en: "Coffee".to_string(),
        },
        covers: smallvec!["https://cdn.example.com/cover.png".to_string()],
        list_price,
        floor_price,
        stock: 10,
    }
}

/// Create a product with ten units in stock.
pub(crate) async fn create_product(
    ctx: &TestContext,
    list_price: u64,
    floor_price: u64,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products
        .create_product(new_product(ProductUuid::new(), list_price, floor_price))
        .await
}

/// Attach a percent offer of `hundredths` per cent, e.g. `50` for half off.
pub(crate) async fn create_percent_offer(
    ctx: &TestContext,
    product: ProductUuid,
    hundredths: i64,
) -> Result<OfferRecord, OffersServiceError> {
    ctx.offers
        .create_offer(NewOffer {
            uuid: OfferUuid::new(),
            product,
            name: None,
            discount: Discount::Percent(Decimal::new(hundredths, 2)),
            offer_quantity: 100,
            max_per_client: 5,
            disabled: false,
        })
        .await
}

pub(crate) async fn pending_job_count(ctx: &TestContext) -> Result<u64, ReconciliationError> {
    Ok(ctx.reconciliation.queue_stats().await?.pending)
}
