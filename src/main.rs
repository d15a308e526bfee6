#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use pos_backend::{
    api::{self, AppState},
    config::{database, seed, server::ServerConfig},
    errors::Result,
};
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Shutdown signal received, draining connections.");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed users and catalog if a seed file is present
    let seed_path = seed::seed_file_path();
    if Path::new(&seed_path).exists() {
        let seed_config = seed::load_seed_config(&seed_path)?;
        seed::apply_seed(&db, &seed_config)
            .await
            .inspect_err(|e| error!("Failed to apply seed data: {}", e))?;
    } else {
        warn!("Seed file {} not found, skipping seeding.", seed_path);
    }

    // 5. Serve the API
    let server_config = ServerConfig::from_env()?;
    let listener = TcpListener::bind(server_config.bind_address()).await?;
    info!("POS backend listening on {}", server_config.bind_address());

    axum::serve(listener, api::router(AppState::new(db)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
