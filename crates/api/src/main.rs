use std::sync::Arc;

use anyhow::Context;

use racha_api::app::services::{AppServices, DirectorySeed};
use racha_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    racha_observability::init();

    let config = ApiConfig::from_env()?;

    let services = AppServices::in_memory();
    if let Some(path) = &config.directory_seed {
        services.seed(DirectorySeed::load(path)?)?;
    }

    let app = racha_api::app::build_app_with(&config.jwt_secret, Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
