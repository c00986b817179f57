//! `finboard-migrate`: applies or rolls back the schema outside the server.
//!
//! The server migrates on startup; this tool is for inspecting and resetting
//! a database by hand.

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

const DEFAULT_DATABASE_URL: &str = "sqlite:./finboard.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "finboard-migrate")]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,
    /// Defaults to `up`.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Apply pending migrations.
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations, all of them unless `--steps` is given.
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Drop every table and migrate from scratch.
    Fresh,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => Migrator::up(&db, steps).await?,
        Command::Down { steps } => Migrator::down(&db, steps).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
        Command::Status => Migrator::status(&db).await?,
    }

    Ok(())
}
