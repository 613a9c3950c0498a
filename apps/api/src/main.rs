mod auth;
mod candidates;
mod config;
mod errors;
mod export;
mod extraction;
mod intake;
mod job_description;
mod llm_client;
mod resumes;
mod routes;
mod state;
mod workspace;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::remember::{RedisStore, RememberStore};
use crate::config::Config;
use crate::llm_client::build_provider;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on a missing provider key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobLens API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM provider
    let llm = build_provider(&config.llm)?;
    info!(
        "LLM provider initialized ({}, model: {})",
        llm.name(),
        config.llm.model
    );

    // Remember-me store: Redis when configured, otherwise process memory
    let remember = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::open(url).context("Invalid REDIS_URL")?;
            info!("Remember-me store: Redis");
            RememberStore::new(Arc::new(store))
        }
        None => {
            info!("Remember-me store: in-memory");
            RememberStore::in_memory()
        }
    };

    let cors = build_cors(&config)?;
    let state = AppState::new(config.clone(), llm, remember);

    // Expired sessions and their workspaces are dropped in the background
    auth::spawn_session_sweeper(state.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restricts CORS to `CORS_ORIGIN` when set; permissive otherwise.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    match &config.cors_origin {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .with_context(|| format!("CORS_ORIGIN '{origin}' is not a valid header value"))?;
            Ok(CorsLayer::permissive().allow_origin(origin))
        }
        None => Ok(CorsLayer::permissive()),
    }
}
