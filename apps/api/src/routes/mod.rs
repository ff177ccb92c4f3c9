pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::lessons::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(health::status_handler))
        // Lessons API
        .route("/api/lessons", get(handlers::handle_list_lessons))
        .route("/api/lessons/generate", post(handlers::handle_generate))
        .route("/api/lessons/continue", post(handlers::handle_continue))
        .route("/api/lessons/:id", get(handlers::handle_get_lesson))
        .with_state(state)
}
