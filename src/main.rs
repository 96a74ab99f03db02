use anyhow::Context;
use tracing_subscriber::EnvFilter;

use seedler_api::{build_router, handlers, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORT, LOG_LEVEL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        "Starting {} in {:?} mode",
        config.package_description(),
        config.environment
    );

    for warning in config.startup_warnings() {
        tracing::warn!("{}", warning);
    }

    let registry = handlers::builtin_registry().context("failed to register api modules")?;
    let bind_addr = config.bind_addr();
    let app = build_router(AppState::new(config, registry));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("App now listen on {}...", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
