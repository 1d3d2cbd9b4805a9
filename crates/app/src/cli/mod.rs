use clap::{Parser, Subcommand};

mod db;
mod reconcile;
mod token;
mod user;
mod worker;

#[derive(Debug, Parser)]
#[command(name = "souq-app", about = "Souq CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    User(user::UserCommand),
    Token(token::TokenCommand),
    Reconcile(reconcile::ReconcileCommand),
    Worker(worker::WorkerArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::User(command) => user::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Reconcile(command) => reconcile::run(command).await,
            Commands::Worker(args) => worker::run(args).await,
        }
    }
}
