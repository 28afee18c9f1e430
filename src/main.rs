//! Credit Scoring Server
//!
//! Loads the model once, then serves `/`, `/health` and `/predict`.
//! A model that fails to load leaves the server up in degraded mode.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credit_scoring::config::{Config, LogFormat};
use credit_scoring::scoring::ArtifactLoader;
use credit_scoring::{create_router, AppState, DecisionService, ModelSlot};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "credit_scoring=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize logging
    init_tracing(config.log_format);

    tracing::info!("Credit Scoring Server starting...");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Decision threshold: {}", config.threshold);

    // Load the model before accepting traffic
    let loader = ArtifactLoader::new(config.model_source.clone())
        .expect_sha256(config.model_sha256.clone());
    let (result, report) = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("Model loader task failed")?;
    report.log();

    // Build application state
    let service = DecisionService::new(
        ModelSlot::from_load(result),
        config.sanitizer(),
        config.policy().context("Invalid configuration")?,
        config.schema_mode(),
    );
    let state = AppState::new(service, config.decision_labels);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.bind_addr();
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
