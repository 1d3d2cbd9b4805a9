//! Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        get::{OrderResponse, OrderStatusBody},
    },
    state::State,
};

/// Change Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ChangeOrderStatusRequest {
    pub status: OrderStatusBody,
}

/// Order Status Handler
#[endpoint(
    tags("orders"),
    summary = "Change Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Staff access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, status = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<ChangeOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let principal = depot.principal_or_401()?;
    let order = order.into_inner();
    let status = json.into_inner().status;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("status", tracing::field::debug(status));

    let order = state
        .app
        .orders
        .change_order_status(principal, order.into(), status.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use souq_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        records::{OrderStatus, OrderUuid},
    };

    use crate::{
        orders::tests::make_order,
        test_helpers::{STAFF, consumer_service, staff_service, state_with_orders},
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("orders/{order}/status").put(handler)
    }

    #[tokio::test]
    async fn test_staff_marks_order_delivered() -> TestResult {
        let uuid = OrderUuid::new();

        let mut order = make_order(uuid, Vec::new());

        order.status = OrderStatus::Delivered;

        let mut orders = MockOrdersService::new();

        orders
            .expect_change_order_status()
            .once()
            .withf(move |principal, o, status| {
                *principal == STAFF && *o == uuid && *status == OrderStatus::Delivered
            })
            .return_once(move |_, _, _| Ok(order));

        let mut res = TestClient::put(format!("http://example.com/orders/{uuid}/status"))
            .json(&json!({ "status": "delivered" }))
            .send(&staff_service(state_with_orders(orders), route()))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, OrderStatusBody::Delivered);

        Ok(())
    }

    #[tokio::test]
    async fn test_consumer_change_status_returns_403() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_change_order_status()
            .once()
            .return_once(|_, _, _| Err(OrdersServiceError::Forbidden));

        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "cancelled" }))
        .send(&consumer_service(state_with_orders(orders), route()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
