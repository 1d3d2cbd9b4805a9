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
pub(crate) struct RunArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long)]
    product: Uuid,

    #[arg(long, value_enum)]
    reason: ReasonArg,
}

pub(crate) async fn run(args: RunArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let moved = PgReconciliationService::new(Db::new(pool))
        .move_product_to_draft(ProductUuid::from_uuid(args.product), args.reason.into())
        .await
        .map_err(|error| format!("failed to reconcile product: {error}"))?;

    println!("product_uuid: {}", moved.product);
    println!("reason: {}", moved.reason);
    println!("carts_moved: {}", moved.users.len());

    for user in moved.users {
        println!("user_uuid: {user}");
    }

    Ok(())
}
