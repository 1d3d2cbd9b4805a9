use clap::Args;
use souq_app::{
    database::{self, Db},
    domain::{
        products::records::ProductUuid,
        reconciliation::{PgReconciliationService, ReconciliationService},
    },
};
use uuid::Uuid;

use super::ReasonArg;

#[derive(Debug, Args)]
pub(crate) struct EnqueueArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    product: Uuid,

    #[arg(long, value_enum)]
    reason: ReasonArg,
}

pub(crate) async fn run(args: EnqueueArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let job = PgReconciliationService::new(Db::new(pool))
        .enqueue(ProductUuid::from_uuid(args.product), args.reason.into())
        .await
        .map_err(|error| format!("failed to enqueue reconciliation: {error}"))?;

    println!("job_uuid: {}", job.uuid);
    println!("product_uuid: {}", job.product);
    println!("reason: {}", job.reason);
    println!("run_after: {}", job.run_after);

    Ok(())
}
