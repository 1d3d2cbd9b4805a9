//! Reorder Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    carts::responses::CartResponse, extensions::*, orders::errors::into_status_error,
    state::State,
};

/// Reorder Handler
///
/// Puts the lines of a past order back into the active cart at current
/// prices. Products that are gone or out of stock are skipped.
#[endpoint(
    tags("orders"),
    summary = "Order Again",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated active cart"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let cart = state
        .app
        .orders
        .order_again(principal, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
