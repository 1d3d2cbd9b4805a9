//! Create Offer Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use crate::{
    extensions::*,
    offers::{errors::into_status_error, get::OfferResponse, requests::CreateOfferRequest},
    state::State,
};

/// Create Offer Handler
///
/// Attaches the offer to a product without one and reprices the product.
#[endpoint(
    tags("offers"),
    summary = "Create Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Offer created"),
        (status_code = StatusCode::CONFLICT, description = "Offer exists or product already has one"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Staff access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "offers.create",
    skip(json, depot, res),
    fields(
        offer_uuid = tracing::field::Empty,
        product_uuid = tracing::field::Empty,
        discount_kind = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOfferRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.staff_or_403()?;

    let request = json.into_inner();
    let span = tracing::Span::current();

    span.record("offer_uuid", tracing::field::display(request.uuid));
    span.record("product_uuid", tracing::field::display(request.product));

    let offer = state
        .app
        .offers
        .create_offer(request.into())
        .await
        .map_err(into_status_error)?;

    span.record("discount_kind", offer.discount.kind_as_str());

    res.add_header(LOCATION, format!("/offers/{}", offer.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(offer.into()))
}
