//! Carts
//!
//! Every user has one active cart and one draft cart, both created on first
//! use. Lines in the active cart keep the unit price they were added at;
//! when a product's price changes or it becomes unavailable, the reconciler
//! moves its lines into the draft cart.

pub mod errors;
pub mod records;
mod repositories;
mod services;

pub use errors::CartsServiceError;
pub(crate) use repositories::{PgActiveCartsRepository, PgDraftCartsRepository, try_get_line};
pub use services::*;
