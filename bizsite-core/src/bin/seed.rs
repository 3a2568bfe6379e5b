use anyhow::Context;
use bizsite_core::config::Config;
use bizsite_core::{db, logging, seed};
use dotenv::dotenv;
use tracing::info;

/// Prepares a database without starting the server: applies the schema,
/// creates the administrator and inserts sample content when the portfolio
/// is empty.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init(config.is_production());

    let db_pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("Failed to open {}", config.database_url))?;
    db::run_migrations(&db_pool).await?;

    let report = seed::bootstrap(&db_pool, &config).await?;
    info!(
        admin_created = report.admin_created,
        projects = report.projects_created,
        testimonials = report.testimonials_created,
        "Seeding finished"
    );

    db_pool.close().await;
    Ok(())
}
