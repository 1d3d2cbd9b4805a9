//! App Router

use salvo::Router;

use crate::{auth, carts, drafts, offers, orders, products};

/// Every route that requires a bearer token.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("cart").get(carts::get::handler).push(
                Router::with_path("items")
                    .post(carts::items::create::handler)
                    .push(Router::with_path("batch").post(carts::items::batch::handler))
                    .push(Router::with_path("{product}").delete(carts::items::delete::handler)),
            ),
        )
        .push(
            Router::with_path("drafts").get(drafts::get::handler).push(
                Router::with_path("items")
                    .post(drafts::items::create::handler)
                    .push(
                        Router::with_path("{product}")
                            .delete(drafts::items::delete::handler)
                            .push(
                                Router::with_path("confirm")
                                    .post(drafts::items::confirm::handler),
                            ),
                    ),
            ),
        )
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .post(products::create::handler)
                .push(
                    Router::with_path("{product}")
                        .get(products::get::handler)
                        .put(products::update::handler)
                        .delete(products::delete::handler),
                ),
        )
        .push(
            Router::with_path("offers")
                .get(offers::index::handler)
                .post(offers::create::handler)
                .push(
                    Router::with_path("{offer}")
                        .get(offers::get::handler)
                        .put(offers::update::handler)
                        .delete(offers::delete::handler),
                ),
        )
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .post(orders::create::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .push(Router::with_path("status").put(orders::status::handler))
                        .push(Router::with_path("reorder").post(orders::reorder::handler)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use salvo::{
        Service,
        affix_state::inject,
        http::{StatusCode, header::AUTHORIZATION},
        test::TestClient,
    };
    use souq_app::{
        auth::{AuthServiceError, MockAuthService},
        domain::products::records::ProductUuid,
    };
    use testresult::TestResult;

    use crate::test_helpers::state_with_auth;

    use super::*;

    #[tokio::test]
    async fn test_routes_require_a_bearer_token() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        let service = Service::new(
            Router::new()
                .hoop(inject(state_with_auth(auth)))
                .push(app_router()),
        );

        for path in ["/cart", "/drafts", "/products", "/offers", "/orders"] {
            let res = TestClient::get(format!("http://example.com{path}"))
                .send(&service)
                .await;

            assert_eq!(
                res.status_code,
                Some(StatusCode::UNAUTHORIZED),
                "{path} should need a token"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_revoked_token_cannot_reach_a_handler() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .return_once(|_| Err(AuthServiceError::NotFound));

        let service = Service::new(
            Router::new()
                .hoop(inject(state_with_auth(auth)))
                .push(app_router()),
        );

        let res = TestClient::get(format!("http://example.com/products/{}", ProductUuid::new()))
            .add_header(AUTHORIZATION, "Bearer sq_v1_revoked", true)
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
