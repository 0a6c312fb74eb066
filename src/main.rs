//! Session generation batch job.
//!
//! Expands every active recurring template into concrete sessions over
//! the configured horizon, then exits. Intended to run daily from cron
//! (or manually after editing templates); generation is idempotent, so
//! re-running is always safe.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dojoflow::adapters::postgres::{
    PostgresRosterStore, PostgresSessionRepository, PostgresTemplateRepository,
};
use dojoflow::application::handlers::GenerateSessionsHandler;
use dojoflow::config::AppConfig;
use dojoflow::domain::foundation::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let handler = GenerateSessionsHandler::new(
        Arc::new(PostgresTemplateRepository::new(pool.clone())),
        Arc::new(PostgresSessionRepository::new(pool.clone())),
        Arc::new(PostgresRosterStore::new(pool)),
        Arc::new(SystemClock),
        config.scheduling.horizon_days,
    );

    let summary = handler.generate_all().await?;
    info!(
        templates = summary.templates_processed,
        created = summary.sessions_created,
        failed = summary.failures.len(),
        "generation run complete"
    );
    for failure in &summary.failures {
        warn!(error = %failure, "template skipped");
    }

    if !summary.failures.is_empty() {
        error!("{} template(s) failed to generate", summary.failures.len());
        std::process::exit(1);
    }
    Ok(())
}
