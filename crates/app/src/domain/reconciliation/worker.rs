//! Reconciliation job worker.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use sqlx::Acquire;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::reconciliation::{
        ReconciliationMode,
        errors::ReconciliationError,
        reconciler::Reconciler,
        records::{MovedToDraft, ReconciliationJob},
        repository::PgReconciliationJobsRepository,
    },
};

/// Polling and retry settings for [`ReconciliationWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,

    /// Total runs a job gets, the first one included.
    pub max_attempts: u32,

    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_attempts: 8,
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    fn backoff(&self) -> ExponentialBuilder {
        let retries = usize::try_from(self.max_attempts.saturating_sub(1)).unwrap_or(usize::MAX);

        ExponentialBuilder::default()
            .with_min_delay(self.min_backoff)
            .with_max_delay(self.max_backoff)
            .with_max_times(retries)
            .with_jitter()
    }

    /// Delay before the next run of a job that has failed `attempts` times,
    /// or `None` once it is out of attempts.
    fn retry_delay(&self, attempts: u32) -> Option<Duration> {
        let index = usize::try_from(attempts.checked_sub(1)?).ok()?;

        self.backoff().build().nth(index)
    }
}

/// How a single claimed job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(MovedToDraft),
    Rescheduled { attempts: u32, delay: Duration },
    Failed { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct ReconciliationWorker {
    db: Db,
    config: WorkerConfig,
    reconciler: Reconciler,
    jobs: PgReconciliationJobsRepository,
}

impl ReconciliationWorker {
    #[must_use]
    pub fn new(db: Db, config: WorkerConfig) -> Self {
        Self {
            db,
            config,
            reconciler: Reconciler::new(ReconciliationMode::Inline),
            jobs: PgReconciliationJobsRepository::new(),
        }
    }

    /// Claim and run the oldest due job. Returns `None` when nothing is due.
    ///
    /// # Errors
    ///
    /// Returns an error when the queue itself cannot be read or updated;
    /// failures of the job are recorded on the job instead.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>, ReconciliationError> {
        let mut tx = self.db.begin_transaction().await?;

        let Some(job) = self.jobs.claim_next(&mut tx).await? else {
            tx.commit().await?;

            return Ok(None);
        };

        let mut attempt = tx.begin().await?;

        let result = self
            .reconciler
            .move_product_to_draft_in(&mut attempt, job.product, job.reason)
            .await;

        let outcome = match result {
            Ok(moved) => {
                attempt.commit().await?;

                self.jobs.complete(&mut tx, job.uuid).await?;

                JobOutcome::Completed(moved)
            }
            Err(error) => {
                attempt.rollback().await?;

                self.record_failure(&mut tx, &job, &error).await?
            }
        };

        tx.commit().await?;

        Ok(Some(outcome))
    }

    async fn record_failure(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        job: &ReconciliationJob,
        error: &ReconciliationError,
    ) -> Result<JobOutcome, ReconciliationError> {
        let attempts = job.attempts.saturating_add(1);
        let message = error.to_string();

        let delay = match error {
            ReconciliationError::NotFound => None,
            _ => self.config.retry_delay(attempts),
        };

        if let Some(delay) = delay {
            warn!(
                job_uuid = %job.uuid,
                attempts,
                ?delay,
                "reconciliation job failed, retrying: {message}"
            );

            self.jobs
                .reschedule(tx, job.uuid, attempts, delay, &message)
                .await?;

            return Ok(JobOutcome::Rescheduled { attempts, delay });
        }

        warn!(
            job_uuid = %job.uuid,
            attempts,
            "reconciliation job failed permanently: {message}"
        );

        self.jobs.fail(tx, job.uuid, attempts, &message).await?;

        Ok(JobOutcome::Failed { attempts })
    }

    /// Poll for jobs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval = ?self.config.poll_interval,
            max_attempts = self.config.max_attempts,
            "reconciliation worker started"
        );

        while !*shutdown.borrow() {
            match self.run_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(error) => warn!("reconciliation worker poll failed: {error}"),
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("reconciliation worker stopped");
    }
}
