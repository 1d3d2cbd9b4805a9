//! Get Draft Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, responses::DraftCartResponse},
    extensions::*,
    state::State,
};

/// Get Draft Cart Handler
///
/// Returns the caller's draft cart with the reason each line was moved.
#[endpoint(
    tags("drafts"),
    summary = "Get Draft Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Draft cart"),
        (status_code = StatusCode::FORBIDDEN, description = "Caller is not a consumer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<DraftCartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let cart = state
        .app
        .draft_carts
        .get_cart(principal)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use souq_app::domain::{
        carts::{
            MockDraftCartsService,
            records::{DraftLineItem, DraftReason},
        },
        products::records::ProductUuid,
    };

    use crate::{
        carts::responses::tests::{make_draft, make_line},
        test_helpers::{CONSUMER, consumer_service, state_with_draft_carts},
    };

    use super::*;

    #[tokio::test]
    async fn test_get_draft_includes_reasons() -> TestResult {
        let moved = ProductUuid::new();
        let added = ProductUuid::new();

        let mut draft = make_draft();

        draft.items = vec![
            DraftLineItem {
                line: make_line(moved, 2, 500),
                reason: Some(DraftReason::PriceChange),
            },
            DraftLineItem {
                line: make_line(added, 1, 200),
                reason: None,
            },
        ];

        let mut drafts = MockDraftCartsService::new();

        drafts
            .expect_get_cart()
            .once()
            .withf(|principal| *principal == CONSUMER)
            .return_once(move |_| Ok(draft));

        let body: Value = TestClient::get("http://example.com/drafts")
            .send(&consumer_service(
                state_with_draft_carts(drafts),
                Router::with_path("drafts").get(handler),
            ))
            .await
            .take_json()
            .await?;

        assert_eq!(
            body.pointer("/items/0/product"),
            Some(&Value::from(moved.to_string()))
        );
        assert_eq!(
            body.pointer("/items/0/reason"),
            Some(&Value::from("price_change"))
        );
        assert_eq!(body.pointer("/items/0/line_total"), Some(&Value::from(1_000)));
        assert_eq!(body.pointer("/items/1/reason"), Some(&Value::Null));

        Ok(())
    }
}
