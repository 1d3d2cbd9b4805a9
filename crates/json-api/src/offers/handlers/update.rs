//! Update Offer Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, get::OfferResponse, requests::UpdateOfferRequest},
    state::State,
};

/// Update Offer Handler
///
/// Replaces the offer's terms. Naming another product moves the offer and
/// reprices both products.
#[endpoint(
    tags("offers"),
    summary = "Update Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer or product not found"),
        (status_code = StatusCode::CONFLICT, description = "Target product already has an offer"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Staff access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    json: JsonBody<UpdateOfferRequest>,
    depot: &mut Depot,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.staff_or_403()?;

    let offer = state
        .app
        .offers
        .update_offer(offer.into_inner().into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(offer.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq_app::domain::{
        offers::{MockOffersService, OffersServiceError, records::OfferUuid},
        pricing::Discount,
        products::records::ProductUuid,
    };

    use crate::{
        offers::tests::make_offer,
        test_helpers::{staff_service, state_with_offers},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("offers/{offer}").put(handler)
    }

    #[tokio::test]
    async fn test_update_moves_offer_to_new_product() -> TestResult {
        let uuid = OfferUuid::new();
        let target = ProductUuid::new();

        let mut offer = make_offer(uuid, target);

        offer.discount = Discount::Fixed(150);

        let mut repo = MockOffersService::new();

        repo.expect_update_offer()
            .once()
            .withf(move |o, update| {
                *o == uuid
                    && update.product == Some(target)
                    && update.discount == Discount::Fixed(150)
                    && update.offer_quantity == 20
            })
            .return_once(move |_, _| Ok(offer));

        repo.expect_change_offer_product().never();

        let mut res = TestClient::put(format!("http://example.com/offers/{uuid}"))
            .json(&json!({
                "product": target.into_uuid(),
                "discount": { "type": "fixed", "amount": 150 },
                "offer_quantity": 20,
                "max_per_client": 2,
            }))
            .send(&staff_service(state_with_offers(repo), route()))
            .await;

        let response: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(response.product, target.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_move_returns_409() -> TestResult {
        let mut repo = MockOffersService::new();

        repo.expect_update_offer()
            .once()
            .return_once(|_, _| Err(OffersServiceError::ConcurrentUpdate));

        let res = TestClient::put(format!("http://example.com/offers/{}", OfferUuid::new()))
            .json(&json!({
                "product": ProductUuid::new().into_uuid(),
                "discount": { "type": "fixed", "amount": 150 },
                "offer_quantity": 20,
                "max_per_client": 2,
            }))
            .send(&staff_service(state_with_offers(repo), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
