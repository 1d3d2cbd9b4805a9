//! Reconciliation Jobs Repository

use std::time::Duration;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::try_get_u64,
    domain::{
        carts::records::DraftReason,
        products::records::ProductUuid,
        reconciliation::records::{QueueStats, ReconciliationJob, ReconciliationJobUuid},
    },
};

const ENQUEUE_JOB_SQL: &str = include_str!("sql/enqueue_job.sql");
const CLAIM_NEXT_JOB_SQL: &str = include_str!("sql/claim_next_job.sql");
const GET_JOB_SQL: &str = include_str!("sql/get_job.sql");
const COMPLETE_JOB_SQL: &str = include_str!("sql/complete_job.sql");
const RESCHEDULE_JOB_SQL: &str = include_str!("sql/reschedule_job.sql");
const FAIL_JOB_SQL: &str = include_str!("sql/fail_job.sql");
const COUNT_JOBS_SQL: &str = include_str!("sql/count_jobs.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReconciliationJobsRepository;

impl PgReconciliationJobsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn enqueue(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        reason: DraftReason,
    ) -> Result<ReconciliationJob, sqlx::Error> {
        query_as::<Postgres, ReconciliationJob>(ENQUEUE_JOB_SQL)
            .bind(ReconciliationJobUuid::new().into_uuid())
            .bind(product.into_uuid())
            .bind(reason.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock the oldest due job that no other worker holds.
    pub(crate) async fn claim_next(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<ReconciliationJob>, sqlx::Error> {
        query_as::<Postgres, ReconciliationJob>(CLAIM_NEXT_JOB_SQL)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_job(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: ReconciliationJobUuid,
    ) -> Result<ReconciliationJob, sqlx::Error> {
        query_as::<Postgres, ReconciliationJob>(GET_JOB_SQL)
            .bind(job.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn complete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: ReconciliationJobUuid,
    ) -> Result<(), sqlx::Error> {
        query(COMPLETE_JOB_SQL)
            .bind(job.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn reschedule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: ReconciliationJobUuid,
        attempts: u32,
        delay: Duration,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        query(RESCHEDULE_JOB_SQL)
            .bind(job.into_uuid())
            .bind(to_i32(attempts)?)
            .bind(delay.as_secs_f64())
            .bind(error)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Stop retrying a job; it is kept for inspection.
    pub(crate) async fn fail(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        job: ReconciliationJobUuid,
        attempts: u32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        query(FAIL_JOB_SQL)
            .bind(job.into_uuid())
            .bind(to_i32(attempts)?)
            .bind(error)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn queue_stats(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<QueueStats, sqlx::Error> {
        let row = query(COUNT_JOBS_SQL).fetch_one(&mut **tx).await?;

        Ok(QueueStats {
            pending: try_get_u64(&row, "pending")?,
            failed: try_get_u64(&row, "failed")?,
        })
    }
}

fn to_i32(attempts: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(attempts).map_err(|e| sqlx::Error::ColumnDecode {
        index: "attempts".to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for ReconciliationJob {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let reason: String = row.try_get("reason")?;
        let attempts: i32 = row.try_get("attempts")?;

        Ok(Self {
            uuid: ReconciliationJobUuid::from_uuid(row.try_get("uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            reason: reason.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "reason".to_string(),
                source: Box::new(e),
            })?,
            attempts: u32::try_from(attempts).map_err(|e| sqlx::Error::ColumnDecode {
                index: "attempts".to_string(),
                source: Box::new(e),
            })?,
            run_after: row.try_get::<SqlxTimestamp, _>("run_after")?.to_jiff(),
            last_error: row.try_get("last_error")?,
            failed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("failed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
