use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bible_stories_api::api::{app, AppState};
use bible_stories_api::config::config;
use bible_stories_api::services::{ensure_admin, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config().clone();
    tracing::info!("Starting Bible Stories API in {:?} mode", config.environment);

    let stores = Stores::from_config(&config.database)
        .await
        .context("failed to initialise storage")?;
    tracing::info!("Using {:?} storage", stores.backend());

    ensure_admin(&stores, &config.bootstrap)
        .await
        .context("failed to create bootstrap admin")?;

    let port = config.api.port;
    let state = AppState::new(config, stores).context("invalid security configuration")?;
    let router = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Bible Stories API listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server error")?;

    Ok(())
}
