use std::time::Duration;

use clap::Args;
use souq_app::{
    database::{self, Db},
    domain::reconciliation::{ReconciliationWorker, WorkerConfig},
};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct WorkerArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Sleep between polls when no job is due
    #[arg(long, env = "WORKER_POLL_INTERVAL_MS", default_value_t = 1_000)]
    poll_interval_ms: u64,

    /// Runs a job gets before it is marked failed
    #[arg(long, env = "WORKER_MAX_ATTEMPTS", default_value_t = 8)]
    max_attempts: u32,

    #[arg(long, env = "WORKER_MIN_BACKOFF_MS", default_value_t = 500)]
    min_backoff_ms: u64,

    #[arg(long, env = "WORKER_MAX_BACKOFF_MS", default_value_t = 60_000)]
    max_backoff_ms: u64,
}

impl WorkerArgs {
    fn config(&self) -> Result<WorkerConfig, String> {
        if self.max_attempts == 0 {
            return Err("max-attempts must be at least 1".to_string());
        }

        if self.min_backoff_ms > self.max_backoff_ms {
            return Err("min-backoff-ms must not exceed max-backoff-ms".to_string());
        }

        Ok(WorkerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
            min_backoff: Duration::from_millis(self.min_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        })
    }
}

pub(crate) async fn run(args: WorkerArgs) -> Result<(), String> {
    let config = args.config()?;

    let pool = database::connect_with_retry(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let worker = ReconciliationWorker::new(Db::new(pool), config);

    let (shutdown, receiver) = watch::channel(false);

    let handle = tokio::spawn(async move { worker.run(receiver).await });

    tokio::signal::ctrl_c()
        .await
        .map_err(|error| format!("failed to listen for shutdown signal: {error}"))?;

    info!("shutdown requested");

    let _ = shutdown.send(true);

    handle
        .await
        .map_err(|error| format!("worker task failed: {error}"))
}
