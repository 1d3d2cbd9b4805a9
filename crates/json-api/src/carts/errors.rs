//! Cart Errors

use salvo::http::StatusError;
use tracing::error;

use souq_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::Forbidden => {
            StatusError::forbidden().brief("Carts are only available to consumers")
        }
        CartsServiceError::NotFound => StatusError::not_found().brief("Product not found"),
        CartsServiceError::OutOfStock => StatusError::conflict().brief("Product is out of stock"),
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid cart payload")
        }
        CartsServiceError::Overflow(source) => {
            StatusError::bad_request().brief(source.to_string())
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
