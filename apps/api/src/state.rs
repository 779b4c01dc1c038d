use std::sync::Arc;

use crate::config::Config;
use crate::resumes::store::ResumeStore;
use crate::storage::FileStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: ResumeStore,
    /// Same backend the store writes to; the media route reads through it.
    pub storage: Arc<dyn FileStorage>,
    pub config: Config,
}
