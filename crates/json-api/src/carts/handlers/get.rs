//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Returns the caller's active cart, creating it empty on first use.
#[endpoint(
    tags("carts"),
    summary = "Get Active Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Active cart"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let cart = state
        .app
        .active_carts
        .get_cart(principal)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        carts::{CartsServiceError, MockActiveCartsService},
        products::records::ProductUuid,
    };

    use crate::{
        carts::responses::tests::{make_cart, make_line},
        test_helpers::{CONSUMER, consumer_service, staff_service, state_with_active_carts},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("cart").get(handler)
    }

    #[tokio::test]
    async fn test_get_cart_returns_lines_and_total() -> TestResult {
        let product = ProductUuid::new();
        let cart = make_cart(vec![make_line(product, 2, 500)]);

        let mut carts = MockActiveCartsService::new();

        carts
            .expect_get_cart()
            .once()
            .withf(|principal| *principal == CONSUMER)
            .return_once(move |_| Ok(cart));

        let mut res = TestClient::get("http://example.com/cart")
            .send(&consumer_service(state_with_active_carts(carts), route()))
            .await;

        let body: CartResponse = res.take_json().await?;
        let line = body.items.first();

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.aggregate_total, 1_000);
        assert_eq!(line.map(|l| l.product), Some(product.into_uuid()));
        assert_eq!(line.map(|l| l.line_total), Some(1_000));

        Ok(())
    }

    #[tokio::test]
    async fn test_staff_get_cart_returns_403() -> TestResult {
        let mut carts = MockActiveCartsService::new();

        carts
            .expect_get_cart()
            .once()
            .return_once(|_| Err(CartsServiceError::Forbidden));

        let res = TestClient::get("http://example.com/cart")
            .send(&staff_service(state_with_active_carts(carts), route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
