use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::utils::error::Result;

pub mod buffer;
pub mod handlers;

pub use buffer::PullBuffer;
pub use handlers::{health_check, pull_listings};

#[derive(Clone)]
pub struct AppState {
    pub buffer: PullBuffer,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/pull_listings", get(pull_listings))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

/// Bind and serve the pull endpoint until the process exits.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Pull endpoint listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
