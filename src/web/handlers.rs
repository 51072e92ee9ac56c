use axum::{extract::State, response::Json};

use super::AppState;
use crate::models::Listing;

/// Hand back everything buffered since the previous pull and clear it.
pub async fn pull_listings(State(state): State<AppState>) -> Json<Vec<Listing>> {
    let listings = state.buffer.drain();
    tracing::info!("Pulled {} buffered listings", listings.len());
    Json(listings)
}

// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "listing-monitor",
        "buffered": state.buffer.len(),
    }))
}
