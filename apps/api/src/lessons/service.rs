//! Content Service: orchestrates one generation or continuation request.
//!
//! Flow: build prompts → LLM call → decode → mandatory keys → typed fields →
//!       build lesson → best-effort save → return lesson.
//!
//! Every step before the save is fatal to the request. The save never is.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lessons::models::{ContinuationRequest, GenerationRequest, Lesson};
use crate::lessons::parser::{
    extract_lesson_fields, parse_ai_json, LessonFields, ParseError, ResponseKind,
};
use crate::lessons::prompts::{
    build_continuation_prompts, build_generation_prompts, LessonPrompts, OptionalComponents,
};
use crate::lessons::store::{save_lesson, LessonStore};
use crate::llm_client::LlmGateway;

pub struct ContentService {
    llm: Arc<dyn LlmGateway>,
    store: Arc<dyn LessonStore>,
    vocabulary_limit: Option<usize>,
}

impl ContentService {
    pub fn new(llm: Arc<dyn LlmGateway>, store: Arc<dyn LessonStore>) -> Self {
        Self {
            llm,
            store,
            vocabulary_limit: None,
        }
    }

    /// Caps the number of vocabulary entries kept from each response.
    pub fn with_vocabulary_limit(mut self, limit: Option<usize>) -> Self {
        self.vocabulary_limit = limit;
        self
    }

    /// Generates a new lesson from structured parameters.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Lesson, AppError> {
        info!(
            "Generating lesson: grade={} subject={} words={}",
            request.academic_grade, request.subject, request.word_count
        );

        let prompts = build_generation_prompts(request);
        let fields = self
            .complete(
                &prompts,
                ResponseKind::Generation,
                OptionalComponents::from_request(request),
            )
            .await?;

        let title = fields.title.ok_or(ParseError::MissingField("title"))?;
        let lesson = Lesson {
            id: Uuid::new_v4(),
            title,
            lesson_content: fields.lesson_content,
            academic_grade: request.academic_grade.clone(),
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            teacher_style: request.teacher_style.as_str().to_string(),
            word_count: fields.word_count,
            language: request.language.clone(),
            summary: fields.summary,
            vocabulary: fields.vocabulary,
            quiz: fields.quiz,
            learning_objectives: fields.learning_objectives,
            created_at: Utc::now(),
        };

        Ok(self.persist(lesson).await)
    }

    /// Regenerates a lesson from a previous one plus a teacher instruction.
    ///
    /// Fields the model leaves out keep their previous values. Content and
    /// word count always come from the new output.
    pub async fn continue_lesson(&self, request: &ContinuationRequest) -> Result<Lesson, AppError> {
        let previous = &request.previous_lesson;
        info!("Continuing lesson {} ('{}')", previous.id, previous.title);

        let prompts = build_continuation_prompts(request)?;
        let fields = self
            .complete(&prompts, ResponseKind::Continuation, OptionalComponents::ALL)
            .await?;

        let lesson = merge_continuation(previous, fields);
        Ok(self.persist(lesson).await)
    }

    async fn complete(
        &self,
        prompts: &LessonPrompts,
        kind: ResponseKind,
        components: OptionalComponents,
    ) -> Result<LessonFields, AppError> {
        let raw = self
            .llm
            .call(&prompts.system, &prompts.user, None, None)
            .await?;

        let data = parse_ai_json(&raw)?;
        let fields = extract_lesson_fields(&data, kind, components, self.vocabulary_limit)?;

        info!(
            "Parsed lesson output: {} words, quiz={} vocabulary={}",
            fields.word_count,
            fields.quiz.as_ref().map_or(0, Vec::len),
            fields.vocabulary.as_ref().map_or(0, Vec::len)
        );
        Ok(fields)
    }

    /// Saves the finished lesson and hands it back unchanged.
    async fn persist(&self, lesson: Lesson) -> Lesson {
        let stored_id = save_lesson(self.store.as_ref(), &lesson).await;
        info!("Lesson {} ready (stored as {stored_id})", lesson.id);
        lesson
    }
}

fn merge_continuation(previous: &Lesson, fields: LessonFields) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        title: fields.title.unwrap_or_else(|| previous.title.clone()),
        lesson_content: fields.lesson_content,
        academic_grade: fields
            .academic_grade
            .unwrap_or_else(|| previous.academic_grade.clone()),
        subject: fields.subject.unwrap_or_else(|| previous.subject.clone()),
        topic: fields.topic.or_else(|| previous.topic.clone()),
        teacher_style: fields
            .teacher_style
            .unwrap_or_else(|| previous.teacher_style.clone()),
        word_count: fields.word_count,
        language: fields.language.unwrap_or_else(|| previous.language.clone()),
        summary: fields.summary.or_else(|| previous.summary.clone()),
        vocabulary: fields.vocabulary.or_else(|| previous.vocabulary.clone()),
        quiz: fields.quiz.or_else(|| previous.quiz.clone()),
        learning_objectives: fields
            .learning_objectives
            .or_else(|| previous.learning_objectives.clone()),
        created_at: Utc::now(),
    }
}
