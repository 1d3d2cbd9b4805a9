//! Batch Cart Items Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use souq_app::domain::carts::records::CartItemQuantity;

use crate::{
    carts::{
        errors::into_status_error, items::create::AddCartItemRequest, responses::CartResponse,
    },
    extensions::*,
    state::State,
};

/// Batch Add Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BatchAddRequest {
    pub items: Vec<AddCartItemRequest>,
}

impl From<AddCartItemRequest> for CartItemQuantity {
    fn from(request: AddCartItemRequest) -> Self {
        CartItemQuantity {
            product: request.product.into(),
            quantity: request.quantity,
        }
    }
}

/// Batch Cart Items Handler
///
/// Adds several products at once. Unknown or unavailable products and zero
/// quantities are skipped rather than failing the request.
#[endpoint(
    tags("carts"),
    summary = "Add Several Items to Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<BatchAddRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let items = json.into_inner().items.into_iter().map(Into::into).collect();

    let cart = state
        .app
        .active_carts
        .add_multi_product(principal, items)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
