//! Pluggable lesson storage.
//!
//! `AppState` and `ContentService` hold an `Arc<dyn LessonStore>` chosen once at
//! startup: `PgLessonStore` when `DATABASE_URL` is set, `NoopLessonStore`
//! otherwise. Saving is advisory; see [`save_lesson`].

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::lessons::models::Lesson;
use crate::models::lesson::{LessonRow, LessonSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Lesson could not be encoded: {0}")]
    Encode(serde_json::Error),

    #[error("Stored lesson {id} could not be decoded: {source}")]
    Corrupt {
        id: Uuid,
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Backend name, reported by the status endpoint.
    fn backend(&self) -> &'static str;

    /// Writes one lesson keyed by its own id. `Ok(None)` means the write was
    /// accepted but nothing was stored.
    async fn insert(&self, lesson: &Lesson) -> Result<Option<Uuid>, StoreError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<Lesson>, StoreError>;

    /// Most recent lessons first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<LessonSummary>, StoreError>;

    /// Releases connections. Called once at process shutdown.
    async fn close(&self) {}
}

/// Best-effort save. Never fails: on any store error, or when nothing was
/// stored, the lesson's own id is returned instead.
pub async fn save_lesson(store: &dyn LessonStore, lesson: &Lesson) -> Uuid {
    match store.insert(lesson).await {
        Ok(Some(stored_id)) => {
            info!("Saved lesson {} as row {}", lesson.id, stored_id);
            stored_id
        }
        Ok(None) => {
            warn!(
                "Lesson {} not persisted ({} store); returning its own id",
                lesson.id,
                store.backend()
            );
            lesson.id
        }
        Err(e) => {
            warn!(
                "Failed to save lesson {} ({} store): {e}; returning its own id",
                lesson.id,
                store.backend()
            );
            lesson.id
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// No-op store
// ────────────────────────────────────────────────────────────────────────────

/// Stand-in used when no database is configured. Accepts every write and
/// returns empty reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLessonStore;

#[async_trait]
impl LessonStore for NoopLessonStore {
    fn backend(&self) -> &'static str {
        "noop"
    }

    async fn insert(&self, _lesson: &Lesson) -> Result<Option<Uuid>, StoreError> {
        Ok(None)
    }

    async fn fetch(&self, _id: Uuid) -> Result<Option<Lesson>, StoreError> {
        Ok(None)
    }

    async fn list_recent(&self, _limit: i64) -> Result<Vec<LessonSummary>, StoreError> {
        Ok(Vec::new())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgLessonStore {
    pool: PgPool,
}

impl PgLessonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonStore for PgLessonStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, lesson: &Lesson) -> Result<Option<Uuid>, StoreError> {
        let lesson_data = serde_json::to_value(lesson).map_err(StoreError::Encode)?;
        let word_count = i32::try_from(lesson.word_count).unwrap_or(i32::MAX);

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO lessons (id, title, subject, topic, academic_grade, word_count, lesson_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(lesson.id)
        .bind(&lesson.title)
        .bind(&lesson.subject)
        .bind(&lesson.topic)
        .bind(&lesson.academic_grade)
        .bind(word_count)
        .bind(&lesson_data)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(id))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Lesson>, StoreError> {
        let row = sqlx::query_as::<_, LessonRow>("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            serde_json::from_value(row.lesson_data)
                .map_err(|source| StoreError::Corrupt { id: row.id, source })
        })
        .transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<LessonSummary>, StoreError> {
        let rows = sqlx::query_as::<_, LessonSummary>(
            r#"
            SELECT id, title, subject, topic, academic_grade, word_count, created_at
            FROM lessons
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}
