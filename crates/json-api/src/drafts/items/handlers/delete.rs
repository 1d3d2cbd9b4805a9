//! Delete Draft Item Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{PathParam, QueryParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, responses::DraftCartResponse},
    extensions::*,
    state::State,
};

/// Delete Draft Item Handler
///
/// Takes `quantity` units off the draft line, or the whole line when no
/// quantity is given.
#[endpoint(
    tags("drafts"),
    summary = "Remove Item from Draft Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Updated draft cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    quantity: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<DraftCartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let cart = state
        .app
        .draft_carts
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

    use souq_app::domain::{carts::MockDraftCartsService, products::records::ProductUuid};

    use crate::{
        carts::responses::tests::make_draft,
        test_helpers::{consumer_service, state_with_draft_carts},
    };

    use super::*;

    #[tokio::test]
    async fn test_remove_draft_line() -> TestResult {
        let product = ProductUuid::new();

        let mut drafts = MockDraftCartsService::new();

        drafts
            .expect_remove_product()
            .once()
            .withf(move |_, p, quantity| *p == product && *quantity == 1)
            .return_once(|_, _, _| Ok(make_draft()));

        let mut res = TestClient::delete(format!(
            "http://example.com/drafts/items/{product}?quantity=1"
        ))
        .send(&consumer_service(
            state_with_draft_carts(drafts),
            Router::with_path("drafts/items/{product}").delete(handler),
        ))
        .await;

        let body: DraftCartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.items.is_empty());

        Ok(())
    }
}
