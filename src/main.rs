mod api_doc;
mod auth;
mod authorize;
mod config;
mod cors;
mod engine;
mod error;
mod handlers;
mod item;
mod models;
mod path;
mod resolver;
mod response;
mod router;
mod routes;
mod state;
mod store;
mod validator;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use config::Config;
use engine::ItemEngine;
use state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pathlink=info,tower_http=info")),
        )
        .init();

    tracing::info!("pathlink starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = store::connect(&config.storage).await?;
    let engine = ItemEngine::new(store, config.site.clone());

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let state = AppState {
        engine,
        config: Arc::new(config),
    };
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
