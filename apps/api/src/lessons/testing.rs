//! Test doubles shared by the lesson tests: a scripted LLM gateway and
//! in-memory / failing stores.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::lessons::models::{GenerationRequest, Lesson, QuizItem, QuizOption, VocabularyItem};
use crate::lessons::store::{LessonStore, StoreError};
use crate::llm_client::{LlmError, LlmGateway};
use crate::models::lesson::LessonSummary;

/// Gateway that replays canned results in order and records every prompt pair.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGateway {
    pub fn replying(text: impl Into<String>) -> Self {
        let gateway = Self::default();
        gateway.replies.lock().unwrap().push_back(Ok(text.into()));
        gateway
    }

    pub fn failing(error: LlmError) -> Self {
        let gateway = Self::default();
        gateway.replies.lock().unwrap().push_back(Err(error));
        gateway
    }

    /// (system, user) prompt pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _model: Option<&str>,
        _timeout: Option<Duration>,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Connection("script exhausted".to_string())))
    }
}

/// Store that keeps lessons in memory, keyed by their own ids.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(Uuid, Lesson)>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Lessons exactly as they were written, oldest first.
    pub fn saved(&self) -> Vec<Lesson> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|(_, lesson)| lesson.clone())
            .collect()
    }
}

#[async_trait]
impl LessonStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, lesson: &Lesson) -> Result<Option<Uuid>, StoreError> {
        self.rows.lock().unwrap().push((lesson.id, lesson.clone()));
        Ok(Some(lesson.id))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Lesson>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, lesson)| lesson.clone()))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<LessonSummary>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .map(|(id, lesson)| LessonSummary {
                id: *id,
                title: lesson.title.clone(),
                subject: lesson.subject.clone(),
                topic: lesson.topic.clone(),
                academic_grade: lesson.academic_grade.clone(),
                word_count: lesson.word_count as i32,
                created_at: lesson.created_at,
            })
            .collect())
    }
}

/// Store whose every operation fails.
pub struct RejectingStore;

#[async_trait]
impl LessonStore for RejectingStore {
    fn backend(&self) -> &'static str {
        "rejecting"
    }

    async fn insert(&self, _lesson: &Lesson) -> Result<Option<Uuid>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn fetch(&self, _id: Uuid) -> Result<Option<Lesson>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_recent(&self, _limit: i64) -> Result<Vec<LessonSummary>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

pub fn generation_request() -> GenerationRequest {
    serde_json::from_value(json!({
        "academic_grade": "6",
        "subject": "Earth Science",
        "topic": "Volcanoes",
        "teacher_style": "Encouraging",
        "word_count": 120
    }))
    .unwrap()
}

pub fn sample_lesson() -> Lesson {
    let quiz = QuizItem::new(
        "q1".to_string(),
        "What comes out of a volcano?".to_string(),
        vec![
            QuizOption {
                id: "a".to_string(),
                text: "Lava".to_string(),
            },
            QuizOption {
                id: "b".to_string(),
                text: "Milk".to_string(),
            },
        ],
        "a".to_string(),
    )
    .unwrap();

    Lesson {
        id: Uuid::new_v4(),
        title: "Inside a Volcano".to_string(),
        lesson_content: "Volcanoes release molten rock called lava.".to_string(),
        academic_grade: "6".to_string(),
        subject: "Earth Science".to_string(),
        topic: Some("Volcanoes".to_string()),
        teacher_style: "Encouraging".to_string(),
        word_count: 6,
        language: "English".to_string(),
        summary: None,
        vocabulary: Some(vec![VocabularyItem {
            term: "Lava".to_string(),
            definition: "Molten rock above ground".to_string(),
        }]),
        quiz: Some(vec![quiz]),
        learning_objectives: Some(vec!["Describe an eruption".to_string()]),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}
