//! Applies or inspects the `caja` schema outside of the server, e.g.
//! `migration --database-url sqlite:./caja.db?mode=rwc fresh`.

use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[derive(Debug, Parser)]
#[command(name = "migration", disable_version_flag = true)]
struct Args {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./caja.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Applies every pending migration.
    Up,
    /// Rolls back every applied migration.
    Down,
    /// Drops all tables and re-applies the schema.
    Fresh,
    /// Lists applied and pending migrations.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("migration=info,sea_orm_migration=info")
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Up);
    let db = Database::connect(&args.database_url).await?;
    tracing::info!("running {command:?} against {}", args.database_url);

    match command {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, None).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    tracing::info!("{command:?} done");
    Ok(())
}
