//! Reconciliation Config

use clap::Args;
use souq_app::domain::reconciliation::ReconciliationMode;

/// Where catalog writes reconcile active carts.
#[derive(Debug, Args)]
pub struct ReconciliationConfig {
    /// `queued` leaves jobs for `souq-app worker`; `inline` moves lines in
    /// the writing request.
    #[arg(
        long,
        env = "RECONCILIATION_MODE",
        value_enum,
        default_value_t = ReconciliationMode::Queued
    )]
    pub reconciliation_mode: ReconciliationMode,
}
