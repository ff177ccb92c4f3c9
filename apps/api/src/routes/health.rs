use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/status
/// Returns service version, the active storage backend and the configured model.
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "easylesson-api",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend(),
        "model": state.config.openrouter_model,
    }))
}
