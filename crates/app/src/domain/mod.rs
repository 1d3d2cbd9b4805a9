//! Souq Domain Concerns

pub mod carts;
pub mod offers;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod reconciliation;
pub mod users;
