//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use souq_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::Forbidden => StatusError::forbidden(),
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::EmptyCart => StatusError::bad_request().brief("Cart is empty"),
        OrdersServiceError::ConcurrentUpdate => {
            StatusError::conflict().brief("Cart changed while placing the order, try again")
        }
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Overflow(source) => {
            StatusError::bad_request().brief(source.to_string())
        }
        OrdersServiceError::InvalidPrice(source) => {
            error!("failed to reprice after order: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Reconciliation(source) => {
            error!("failed to reconcile carts after order: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
