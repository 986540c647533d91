use std::sync::Arc;

use crate::config::Config;
use crate::fetch::RemoteFetcher;
use crate::model::ModelClient;

/// Shared application state injected into all route handlers via Axum
/// extractors.
///
/// `model` is `None` when GEMINI_API_KEY is missing or roster construction
/// failed at startup; the generation endpoints report 500 until then.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fetcher: RemoteFetcher,
    pub model: Option<Arc<ModelClient>>,
}
