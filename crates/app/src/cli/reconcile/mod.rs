use clap::{Args, Subcommand, ValueEnum};
use souq_app::domain::reconciliation::DraftReason;

mod enqueue;
mod run;

#[derive(Debug, Args)]
pub(crate) struct ReconcileCommand {
    #[command(subcommand)]
    command: ReconcileSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReconcileSubcommand {
    /// Move a product's active-cart lines to draft carts now
    Run(run::RunArgs),

    /// Leave a job for the worker
    Enqueue(enqueue::EnqueueArgs),
}

/// Command-line form of [`DraftReason`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReasonArg {
    PriceChange,
    OutOfStock,
}

impl From<ReasonArg> for DraftReason {
    fn from(reason: ReasonArg) -> Self {
        match reason {
            ReasonArg::PriceChange => Self::PriceChange,
            ReasonArg::OutOfStock => Self::OutOfStock,
        }
    }
}

pub(crate) async fn run(command: ReconcileCommand) -> Result<(), String> {
    match command.command {
        ReconcileSubcommand::Run(args) => run::run(args).await,
        ReconcileSubcommand::Enqueue(args) => enqueue::run(args).await,
    }
}
