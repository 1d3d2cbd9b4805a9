//! Order Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq_app::domain::orders::records::{OrderFilter, OrderStatus};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// The page of orders, newest first
    pub orders: Vec<OrderResponse>,
}

/// Order Index Handler
///
/// Staff may filter by user; consumers always get their own orders.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    status: QueryParam<String, false>,
    user: QueryParam<Uuid, false>,
    offset: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;

    let status = status
        .into_inner()
        .map(|status| status.parse::<OrderStatus>())
        .transpose()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let defaults = OrderFilter::default();

    let filter = OrderFilter {
        status,
        user: user.into_inner().map(Into::into),
        offset: offset.into_inner().unwrap_or(defaults.offset),
        limit: limit.into_inner().unwrap_or(defaults.limit),
    };

    let orders = state
        .app
        .orders
        .list_orders(principal, filter)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use souq_app::domain::{
        orders::{MockOrdersService, records::OrderUuid},
        users::records::UserUuid,
    };

    use crate::{
        orders::tests::make_order,
        test_helpers::{STAFF, staff_service, state_with_orders},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        staff_service(
            state_with_orders(orders),
            Router::with_path("orders").get(handler),
        )
    }

    #[tokio::test]
    async fn test_index_applies_query_filters() -> TestResult {
        let user = UserUuid::new();
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders()
            .once()
            .withf(move |principal, filter| {
                *principal == STAFF
                    && *filter
                        == OrderFilter {
                            status: Some(OrderStatus::Delivered),
                            user: Some(user),
                            offset: 40,
                            limit: 10,
                        }
            })
            .return_once(move |_, _| Ok(vec![make_order(uuid, Vec::new())]));

        let mut res = TestClient::get(format!(
            "http://example.com/orders?status=delivered&user={user}&offset=40&limit=10"
        ))
        .send(&make_service(orders))
        .await;

        let body: OrdersResponse = res.take_json().await?;
        let uuids: Vec<_> = body.orders.iter().map(|o| o.uuid).collect();

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(uuids, vec![uuid.into_uuid()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_index_defaults_to_first_page() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders()
            .once()
            .withf(|_, filter| *filter == OrderFilter::default())
            .return_once(|_, _| Ok(Vec::new()));

        let res = TestClient::get("http://example.com/orders")
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_index_unknown_status_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_list_orders().never();

        let res = TestClient::get("http://example.com/orders?status=lost")
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
