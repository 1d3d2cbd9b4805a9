//! Reconciliation
//!
//! Keeps active carts consistent with the catalog: when a product's
//! effective price changes or it becomes unavailable, every active-cart line
//! for it is moved into its owner's draft cart.

use std::fmt;

use clap::ValueEnum;

pub mod errors;
mod reconciler;
pub mod records;
mod repository;
pub mod service;
pub mod worker;

pub use crate::domain::carts::records::DraftReason;
pub use errors::ReconciliationError;
pub(crate) use reconciler::Reconciler;
pub use service::*;
pub use worker::{ReconciliationWorker, WorkerConfig};

/// Where reconciliation runs once a price change has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReconciliationMode {
    /// Enqueue a job in the writer's transaction for the worker to pick up.
    #[default]
    Queued,

    /// Move the lines inside the writer's transaction.
    Inline,
}

impl fmt::Display for ReconciliationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Queued => "queued",
            Self::Inline => "inline",
        })
    }
}
