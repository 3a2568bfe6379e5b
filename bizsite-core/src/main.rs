use std::net::SocketAddr;

use anyhow::Context;
use bizsite_core::config::Config;
use bizsite_core::{create_router, db, logging, seed, AppState};
use dotenv::dotenv;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init(config.is_production());

    info!("Starting bizsite server ({})...", config.environment);

    let db_pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to open database")?;
    db::run_migrations(&db_pool).await.context("Failed to run migrations")?;
    seed::bootstrap(&db_pool, &config).await?;

    let address = config.bind_address();
    let app = create_router(AppState::new(db_pool, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", address, e))?;

    info!("Server listening on {}", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
