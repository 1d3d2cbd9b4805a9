//! Carts
//!
//! `/cart` is the caller's active cart; lines there keep the price they were
//! added at. `/drafts` holds lines moved out of it after a price change or a
//! stock-out, until the shopper confirms them again.

pub(crate) mod errors;
mod handlers;
pub(crate) mod items;
pub(crate) mod responses;

pub(crate) use handlers::*;
