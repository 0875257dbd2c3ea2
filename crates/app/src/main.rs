use std::{net::SocketAddr, sync::Arc};

use engine::DiskStorage;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "caja={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let uploads = settings.uploads;

    let db = parse_database(&server.database).await?;
    let storage = DiskStorage::new(&uploads.dir, uploads.public_base_url.as_str());
    tracing::info!("storing receipts in {}", storage.root().display());

    let engine = engine::Engine::builder()
        .database(db)
        .storage(Arc::new(storage))
        .build()
        .await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server.port).parse()?;
    let options = server::ServerOptions {
        addr,
        max_body_bytes: uploads.max_file_bytes,
    };
    let listener = tokio::net::TcpListener::bind(options.addr).await?;
    server::run_with_listener(engine, listener, options).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
