//! User synchronization webhook service.
//!
//! Main entry point. Loads configuration, connects the user store and
//! serves the webhook endpoint until a shutdown signal arrives.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use usersync_api::{config::PROVIDER_SECRET_VAR, AppState, Config};
use usersync_core::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting user synchronization service");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        environment = %config.app_env,
        max_connections = config.database_max_connections,
        "Configuration loaded"
    );

    let settings = config.webhook_settings();
    if settings.secret.is_none() {
        warn!(
            "{} is not set; every webhook request will be rejected until it is configured",
            PROVIDER_SECRET_VAR
        );
    }

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    let storage = Storage::new(db_pool.clone());
    storage.migrate().await.context("Failed to create users table")?;
    info!("Database schema ready");

    let state = AppState::new(Arc::new(storage), settings)
        .with_request_timeout(config.request_timeout());
    let addr = config.parse_server_addr()?;

    usersync_api::start_server(state, addr).await.context("Server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Shutdown complete");
    Ok(())
}

/// Initializes tracing, preferring `RUST_LOG` from the environment over the
/// configured directive.
fn init_tracing(configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{configured},usersync=debug,tower_http=debug")))
        .context("Invalid log filter directive")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(config.database_idle_timeout))
            .max_lifetime(Duration::from_secs(config.database_max_lifetime))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
