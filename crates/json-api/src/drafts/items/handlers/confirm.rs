//! Confirm Draft Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Confirm Draft Item Handler
///
/// Moves the draft line back into the active cart at the product's current
/// price and returns the active cart.
#[endpoint(
    tags("drafts"),
    summary = "Confirm Draft Item",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated active cart"),
        (status_code = StatusCode::NOT_FOUND, description = "No such draft line or product"),
        (status_code = StatusCode::CONFLICT, description = "Product is out of stock"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "drafts.confirm",
    skip(product, depot),
    fields(user_uuid = tracing::field::Empty, product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;
    let product = product.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(principal.user));
    span.record("product_uuid", tracing::field::display(product));

    let cart = state
        .app
        .draft_carts
        .confirm_product(principal, product.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        carts::{CartsServiceError, MockDraftCartsService},
        products::records::ProductUuid,
    };

    use crate::{
        carts::responses::tests::{make_cart, make_line},
        test_helpers::{CONSUMER, consumer_service, state_with_draft_carts},
    };

    use super::*;

    fn make_service(drafts: MockDraftCartsService) -> Service {
        consumer_service(
            state_with_draft_carts(drafts),
            Router::with_path("drafts/items/{product}/confirm").post(handler),
        )
    }

    #[tokio::test]
    async fn test_confirm_returns_active_cart_at_current_price() -> TestResult {
        let product = ProductUuid::new();
        let cart = make_cart(vec![make_line(product, 2, 1_000)]);

        let mut drafts = MockDraftCartsService::new();

        drafts
            .expect_confirm_product()
            .once()
            .withf(move |principal, p| *principal == CONSUMER && *p == product)
            .return_once(move |_, _| Ok(cart));

        let mut res = TestClient::post(format!(
            "http://example.com/drafts/items/{product}/confirm"
        ))
        .send(&make_service(drafts))
        .await;

        let body: CartResponse = res.take_json().await?;
        let line = body.items.first();

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(line.map(|l| l.unit_price), Some(1_000));
        assert_eq!(body.aggregate_total, 2_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_missing_line_returns_404() -> TestResult {
        let mut drafts = MockDraftCartsService::new();

        drafts
            .expect_confirm_product()
            .once()
            .return_once(|_, _| Err(CartsServiceError::NotFound));

        let res = TestClient::post(format!(
            "http://example.com/drafts/items/{}/confirm",
            ProductUuid::new()
        ))
        .send(&make_service(drafts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
