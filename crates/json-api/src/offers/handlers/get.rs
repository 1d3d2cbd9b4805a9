//! Get Offer Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::offers::records::OfferRecord;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, requests::DiscountBody},
    products::get::NameBody,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OfferResponse {
    /// The unique identifier of the offer
    pub uuid: Uuid,

    /// The product the offer discounts
    pub product: Uuid,

    /// Optional display name
    pub name: Option<NameBody>,

    /// Discount terms
    pub discount: DiscountBody,

    /// Units that may be sold under the offer
    pub offer_quantity: u64,

    /// Units one client may buy under the offer
    pub max_per_client: u64,

    /// Units already sold under the offer
    pub quantity_purchased: u64,

    /// Whether the offer was switched off
    pub disabled: bool,

    /// Whether the offer currently discounts its product
    pub active: bool,

    /// The date and time the offer was created
    pub created_at: String,

    /// The date and time the offer was last updated
    pub updated_at: String,
}

impl From<OfferRecord> for OfferResponse {
    fn from(offer: OfferRecord) -> Self {
        OfferResponse {
            active: offer.is_valid(),
            uuid: offer.uuid.into(),
            product: offer.product.into(),
            name: offer.name.map(Into::into),
            discount: offer.discount.into(),
            offer_quantity: offer.offer_quantity,
            max_per_client: offer.max_per_client,
            quantity_purchased: offer.quantity_purchased,
            disabled: offer.disabled,
            created_at: offer.created_at.to_string(),
            updated_at: offer.updated_at.to_string(),
        }
    }
}

/// Get Offer Handler
#[endpoint(
    tags("offers"),
    summary = "Get Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer found"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Staff access required"),
    ),
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.staff_or_403()?;

    let offer = state
        .app
        .offers
        .get_offer(offer.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(offer.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        offers::{MockOffersService, OffersServiceError, records::OfferUuid},
        products::records::ProductUuid,
    };

    use crate::{
        offers::tests::make_offer,
        test_helpers::{consumer_service, staff_service, state_with_offers},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("offers/{offer}").get(handler)
    }

    #[tokio::test]
    async fn test_get_offer_reports_exhaustion() -> TestResult {
        let uuid = OfferUuid::new();
        let product = ProductUuid::new();

        let mut offer = make_offer(uuid, product);

        offer.quantity_purchased = 20;

        let mut repo = MockOffersService::new();

        repo.expect_get_offer()
            .once()
            .withf(move |o| *o == uuid)
            .return_once(move |_| Ok(offer));

        let mut res = TestClient::get(format!("http://example.com/offers/{uuid}"))
            .send(&staff_service(state_with_offers(repo), route()))
            .await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.product, product.into_uuid());
        assert_eq!(body.discount, DiscountBody::Fixed { amount: 300 });
        assert!(!body.active, "an exhausted offer should not be active");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_offer_returns_404() -> TestResult {
        let mut repo = MockOffersService::new();

        repo.expect_get_offer()
            .once()
            .return_once(|_| Err(OffersServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/offers/{}", OfferUuid::new()))
            .send(&staff_service(state_with_offers(repo), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_consumer_cannot_read_offers() -> TestResult {
        let mut repo = MockOffersService::new();

        repo.expect_get_offer().never();

        let res = TestClient::get(format!("http://example.com/offers/{}", OfferUuid::new()))
            .send(&consumer_service(state_with_offers(repo), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
