mod config;
mod errors;
mod extract;
mod fetch;
mod model;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::fetch::RemoteFetcher;
use crate::model::gemini::GeminiBackend;
use crate::model::ModelClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.rust_log)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Assist API v{}", env!("CARGO_PKG_VERSION"));

    let model = build_model_client(&config).await;

    let state = AppState {
        config: config.clone(),
        fetcher: RemoteFetcher::new(),
        model,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the model client when a key is present. A missing key or an
/// unusable roster is a warning, not a startup failure: `/` and `/health`
/// stay up and the generation endpoints report 500 until the key is fixed.
async fn build_model_client(config: &Config) -> Option<Arc<ModelClient>> {
    if !config.is_gemini_configured() {
        warn!("GEMINI_API_KEY is not set; generation endpoints are disabled");
        return None;
    }

    let backend = Arc::new(GeminiBackend::new(config.gemini_api_key.clone()));
    match ModelClient::connect(backend).await {
        Ok(client) => {
            info!(
                "Model client initialized (roster: {})",
                client.roster().join(", ")
            );
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Model client initialization failed: {e}");
            None
        }
    }
}
