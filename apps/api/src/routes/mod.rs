pub mod health;
pub mod resume;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::fetch::MAX_FILE_SIZE;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/resume_ats_score", post(resume::handle_ats_score))
        .route("/cover_letter_generator", post(resume::handle_cover_letter))
        .route("/ats_resume_generator", post(resume::handle_ats_resume))
        // Room for a 10MB document plus multipart framing and text fields.
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
        .with_state(state)
}
