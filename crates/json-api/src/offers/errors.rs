//! Offer Errors

use salvo::http::StatusError;
use tracing::error;

use souq_app::domain::offers::OffersServiceError;

pub(crate) fn into_status_error(error: OffersServiceError) -> StatusError {
    match error {
        OffersServiceError::AlreadyExists => StatusError::conflict().brief("Offer already exists"),
        OffersServiceError::ProductHasOffer => {
            StatusError::conflict().brief("Product already has an offer")
        }
        OffersServiceError::ConcurrentUpdate => {
            StatusError::conflict().brief("Offer was changed concurrently, retry the request")
        }
        OffersServiceError::NotFound => StatusError::not_found().brief("Offer not found"),
        OffersServiceError::ProductNotFound => StatusError::not_found().brief("Product not found"),
        OffersServiceError::InvalidOffer(source) => {
            StatusError::bad_request().brief(source.to_string())
        }
        OffersServiceError::InvalidReference
        | OffersServiceError::MissingRequiredData
        | OffersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid offer payload")
        }
        OffersServiceError::Reconciliation(source) => {
            error!("failed to reconcile carts for offer: {source}");

            StatusError::internal_server_error()
        }
        OffersServiceError::Sql(source) => {
            error!("offer storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
