use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `lessons` table. `lesson_data` holds the full serialized
/// lesson; the scalar columns are denormalized copies for listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LessonRow {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub topic: Option<String>,
    pub academic_grade: String,
    pub word_count: i32,
    pub lesson_data: Value,
    pub created_at: DateTime<Utc>,
}

/// Listing projection of a stored lesson (no blob).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LessonSummary {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub topic: Option<String>,
    pub academic_grade: String,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
}
