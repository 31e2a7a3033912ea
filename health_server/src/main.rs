//! Standalone health server: liveness plus readiness for a configured database

use anyhow::Result;
use health_core::{shutdown_signal, sql_probe, Checker, HealthConfig};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = HealthConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Health server will bind to: {}", config.bind_address());

    let checker = Checker::from_config(&config);

    if let Some(url) = &config.database.url {
        info!("Registering database readiness probe");
        let pool = SqlitePool::connect_lazy(url)
            .map_err(|e| anyhow::anyhow!("Invalid database URL: {}", e))?;
        checker.add_readiness_probe("database", sql_probe(pool));
    }

    info!(
        "Serving {} and {} with {} readiness probe(s)",
        config.routes.alive_path,
        config.routes.ready_path,
        checker.registry().len()
    );

    let shutdown = checker.serve_background(&config.bind_address());

    shutdown_signal().await;
    shutdown.shutdown().await;

    info!("Health server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        format!(
            "{}={},health_core={},tower_http=info",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
