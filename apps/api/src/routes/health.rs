use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Service identification banner.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Resume ATS Score API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// GET /health
/// Reports whether the Gemini backend is configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "gemini_configured": state.config.is_gemini_configured()
    }))
}
