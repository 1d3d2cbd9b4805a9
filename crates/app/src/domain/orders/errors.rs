//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    carts::records::CartOverflow,
    pricing::PricingError,
    reconciliation::ReconciliationError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("operation not permitted for this user")]
    Forbidden,

    #[error("order not found")]
    NotFound,

    #[error("cart is empty")]
    EmptyCart,

    #[error("cart changed while the order was being placed")]
    ConcurrentUpdate,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("order total out of range")]
    Overflow(#[from] CartOverflow),

    #[error("stored offer is invalid")]
    InvalidPrice(#[source] PricingError),

    #[error("reconciliation failed")]
    Reconciliation(#[from] ReconciliationError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::UniqueViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<PricingError> for OrdersServiceError {
    fn from(error: PricingError) -> Self {
        Self::InvalidPrice(error)
    }
}
