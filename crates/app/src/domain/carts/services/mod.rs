//! Cart Services

use crate::{auth::Principal, domain::carts::errors::CartsServiceError};

mod active;
mod draft;

pub use active::*;
pub use draft::*;

/// Carts belong to consumers; staff and admins never hold one.
fn ensure_consumer(principal: &Principal) -> Result<(), CartsServiceError> {
    if principal.is_consumer() {
        Ok(())
    } else {
        Err(CartsServiceError::Forbidden)
    }
}

fn ensure_quantity(quantity: u64) -> Result<(), CartsServiceError> {
    if quantity == 0 {
        return Err(CartsServiceError::InvalidData);
    }

    Ok(())
}
