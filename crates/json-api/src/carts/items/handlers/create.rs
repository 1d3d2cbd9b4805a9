//! Create Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub product: Uuid,
    pub quantity: u64,
}

/// Create Cart Item Handler
///
/// Adds units at the product's current price. A line already in the cart
/// keeps the price it was created at.
#[endpoint(
    tags("carts"),
    summary = "Add Item to Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated cart"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::CONFLICT, description = "Product is out of stock"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;
    let request = json.into_inner();

    let cart = state
        .app
        .active_carts
        .add_product(principal, request.product.into(), request.quantity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq_app::domain::{
        carts::{CartsServiceError, MockActiveCartsService},
        products::records::ProductUuid,
    };

    use crate::{
        carts::responses::tests::{make_cart, make_line},
        test_helpers::{CONSUMER, consumer_service, state_with_active_carts},
    };

    use super::*;

    fn make_service(carts: MockActiveCartsService) -> Service {
        consumer_service(
            state_with_active_carts(carts),
            Router::with_path("cart/items").post(handler),
        )
    }

    #[tokio::test]
    async fn test_add_item_success() -> TestResult {
        let product = ProductUuid::new();
        let cart = make_cart(vec![make_line(product, 3, 250)]);

        let mut carts = MockActiveCartsService::new();

        carts
            .expect_add_product()
            .once()
            .withf(move |principal, p, quantity| {
                *principal == CONSUMER && *p == product && *quantity == 3
            })
            .return_once(move |_, _, _| Ok(cart));

        carts.expect_add_multi_product().never();

        let mut res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product": product.into_uuid(), "quantity": 3 }))
            .send(&make_service(carts))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.aggregate_total, 750);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_zero_quantity_returns_400() -> TestResult {
        let mut carts = MockActiveCartsService::new();

        carts
            .expect_add_product()
            .once()
            .withf(|_, _, quantity| *quantity == 0)
            .return_once(|_, _, _| Err(CartsServiceError::InvalidData));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product": ProductUuid::new().into_uuid(), "quantity": 0 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_product_returns_404() -> TestResult {
        let mut carts = MockActiveCartsService::new();

        carts
            .expect_add_product()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::NotFound));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product": ProductUuid::new().into_uuid(), "quantity": 1 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_out_of_stock_product_returns_409() -> TestResult {
        let mut carts = MockActiveCartsService::new();

        carts
            .expect_add_product()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::OutOfStock));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product": ProductUuid::new().into_uuid(), "quantity": 1 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
