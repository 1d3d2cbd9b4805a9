//! Products

pub mod data;
pub mod errors;
mod prices;
pub mod records;
mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub(crate) use prices::{PgPriceSync, PriceChange};
pub(crate) use repository::PgProductsRepository;
pub use service::*;
