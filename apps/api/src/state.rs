use std::sync::Arc;

use crate::config::Config;
use crate::lessons::service::ContentService;
use crate::lessons::store::LessonStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub lessons: Arc<ContentService>,
    /// Same store the content service saves into; read directly by lookups.
    pub store: Arc<dyn LessonStore>,
    pub config: Config,
}
