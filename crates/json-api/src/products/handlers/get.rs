//! Get Product Handler

use std::{string::ToString, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::products::records::{LocalizedName, ProductRecord};

use crate::{extensions::*, products::errors::into_status_error, state::State};

/// Bilingual display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct NameBody {
    /// Arabic name
    pub ar: String,

    /// English name
    pub en: String,
}

impl From<LocalizedName> for NameBody {
    fn from(name: LocalizedName) -> Self {
        NameBody {
            ar: name.ar,
            en: name.en,
        }
    }
}

impl From<NameBody> for LocalizedName {
    fn from(name: NameBody) -> Self {
        LocalizedName {
            ar: name.ar,
            en: name.en,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    /// The unique identifier of the product
    pub uuid: Uuid,

    /// Display name
    pub name: NameBody,

    /// Cover image URLs, first one shown on cart lines
    pub covers: Vec<String>,

    /// Catalog price in minor units
    pub list_price: u64,

    /// Lowest price any offer may bring the product to
    pub floor_price: u64,

    /// Price charged when the product is added to a cart
    pub effective_price: u64,

    /// Units in stock
    pub stock: u64,

    /// Offer currently attached to the product
    pub offer: Option<Uuid>,

    /// The date and time the product was created
    pub created_at: String,

    /// The date and time the product was last updated
    pub updated_at: String,

    /// The date and time the product was deleted
    pub deleted_at: Option<String>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        ProductResponse {
            uuid: product.uuid.into(),
            name: product.name.into(),
            covers: product.covers.into_vec(),
            list_price: product.list_price,
            floor_price: product.floor_price,
            effective_price: product.effective_price,
            stock: product.stock,
            offer: product.offer.map(Into::into),
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
            deleted_at: product.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}

/// Get Product Handler
///
/// Returns a product.
#[endpoint(
    tags("products"),
    summary = "Get Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Product found"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.principal_or_401()?;

    let product = state
        .app
        .products
        .get_product(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        offers::records::OfferUuid,
        products::{MockProductsService, ProductsServiceError, records::ProductUuid},
    };

    use crate::{
        products::tests::make_product,
        test_helpers::{consumer_service, state_with_products},
    };

    use super::*;

    fn make_service(repo: MockProductsService) -> Service {
        consumer_service(
            state_with_products(repo),
            Router::with_path("products/{product}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_get_product_returns_prices_and_offer() -> TestResult {
        let uuid = ProductUuid::new();
        let offer = OfferUuid::new();

        let mut product = make_product(uuid);

        product.effective_price = 500;
        product.offer = Some(offer);

        let mut repo = MockProductsService::new();

        repo.expect_get_product()
            .once()
            .withf(move |p| *p == uuid)
            .return_once(move |_| Ok(product));

        let mut res = TestClient::get(format!("http://example.com/products/{uuid}"))
            .send(&make_service(repo))
            .await;

        let body: ProductResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.uuid, uuid.into_uuid());
        assert_eq!(body.name.en, "Tea");
        assert_eq!(body.list_price, 1_000);
        assert_eq!(body.effective_price, 500);
        assert_eq!(body.offer, Some(offer.into_uuid()));
        assert_eq!(body.deleted_at, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_not_found_returns_404() -> TestResult {
        let uuid = ProductUuid::new();

        let mut repo = MockProductsService::new();

        repo.expect_get_product()
            .once()
            .withf(move |p| *p == uuid)
            .return_once(|_| Err(ProductsServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/products/{uuid}"))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
