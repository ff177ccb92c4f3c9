//! Axum route handlers for the Lessons API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lessons::models::{ContinuationRequest, GenerationRequest, Lesson};
use crate::models::lesson::LessonSummary;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// POST /api/lessons/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    request.validate()?;
    let lesson = state.lessons.generate(&request).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// POST /api/lessons/continue
pub async fn handle_continue(
    State(state): State<AppState>,
    Json(request): Json<ContinuationRequest>,
) -> Result<Json<Lesson>, AppError> {
    request.validate()?;
    let lesson = state.lessons.continue_lesson(&request).await?;
    Ok(Json(lesson))
}

/// GET /api/lessons/:id
pub async fn handle_get_lesson(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state
        .store
        .fetch(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lesson {id} not found")))?;
    Ok(Json(lesson))
}

/// GET /api/lessons?limit=N
pub async fn handle_list_lessons(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<LessonSummary>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}, got {limit}"
        )));
    }
    let lessons = state.store.list_recent(limit).await?;
    Ok(Json(lessons))
}
