//! Delete Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Delete Cart Item Handler
///
/// Takes `quantity` units off the line, or the whole line when no quantity
/// is given. Removing a product that is not in the cart changes nothing.
#[endpoint(
    tags("carts"),
    summary = "Remove Item from Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    quantity: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let cart = state
        .app
        .active_carts
        .remove_product(
            principal,
            product.into_inner().into(),
            quantity.into_inner().unwrap_or(u64::MAX),
        )
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
        test_helpers::{consumer_service, state_with_active_carts},
    };

    use super::*;

    fn make_service(carts: MockActiveCartsService) -> Service {
        consumer_service(
            state_with_active_carts(carts),
            Router::with_path("cart/items/{product}").delete(handler),
        )
    }

    #[tokio::test]
    async fn test_remove_some_units() -> TestResult {
        let product = ProductUuid::new();
        let cart = make_cart(vec![make_line(product, 1, 400)]);

        let mut carts = MockActiveCartsService::new();

        carts
            .expect_remove_product()
            .once()
            .withf(move |_, p, quantity| *p == product && *quantity == 2)
            .return_once(move |_, _, _| Ok(cart));

        let mut res = TestClient::delete(format!(
            "http://example.com/cart/items/{product}?quantity=2"
        ))
        .send(&make_service(carts))
        .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.aggregate_total, 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_without_quantity_drops_the_line() -> TestResult {
        let product = ProductUuid::new();

        let mut carts = MockActiveCartsService::new();

        carts
            .expect_remove_product()
            .once()
            .withf(move |_, p, quantity| *p == product && *quantity == u64::MAX)
            .return_once(|_, _, _| Ok(make_cart(Vec::new())));

        let res = TestClient::delete(format!("http://example.com/cart/items/{product}"))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_zero_quantity_returns_400() -> TestResult {
        let mut carts = MockActiveCartsService::new();

        carts
            .expect_remove_product()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::InvalidData));

        let res = TestClient::delete(format!(
            "http://example.com/cart/items/{}?quantity=0",
            ProductUuid::new()
        ))
        .send(&make_service(carts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
