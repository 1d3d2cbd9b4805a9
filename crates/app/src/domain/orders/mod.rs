//! Orders
//!
//! An order is an immutable copy of the active cart taken at checkout.

pub mod errors;
pub mod records;
mod repository;
mod service;

pub use errors::OrdersServiceError;
pub use service::*;
