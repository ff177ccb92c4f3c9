//! Lesson domain model: inbound requests, quiz/vocabulary items, and the
//! generated lesson returned to callers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;

/// Inclusive bounds on the requested lesson length.
pub const MIN_WORD_COUNT: u32 = 51;
pub const MAX_WORD_COUNT: u32 = 2000;

/// Inclusive bounds on the continuation instruction, in characters.
pub const MIN_INSTRUCTION_CHARS: usize = 10;
pub const MAX_INSTRUCTION_CHARS: usize = 500;

pub const MIN_QUIZ_OPTIONS: usize = 2;
pub const MAX_QUIZ_OPTIONS: usize = 5;

/// Fresh opaque identifier for quiz questions and options.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_word_count() -> u32 {
    300
}

fn default_language() -> String {
    "English".to_string()
}

fn default_true() -> bool {
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Teaching persona the lesson is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherStyle {
    #[default]
    Encouraging,
    Structured,
    Creative,
    Direct,
}

impl TeacherStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherStyle::Encouraging => "Encouraging",
            TeacherStyle::Structured => "Structured",
            TeacherStyle::Creative => "Creative",
            TeacherStyle::Direct => "Direct",
        }
    }
}

/// Request body for lesson generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub academic_grade: String,
    pub subject: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub teacher_style: TeacherStyle,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub include_summary: bool,
    #[serde(default = "default_true")]
    pub include_vocabulary: bool,
    #[serde(default = "default_true")]
    pub include_quiz: bool,
    #[serde(default)]
    pub user_prompt_addition: Option<String>,
}

impl GenerationRequest {
    /// Rejects requests that must never reach the LLM.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.academic_grade.trim().is_empty() {
            return Err(AppError::Validation(
                "academic_grade cannot be empty".to_string(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::Validation("subject cannot be empty".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(AppError::Validation("language cannot be empty".to_string()));
        }
        if !(MIN_WORD_COUNT..=MAX_WORD_COUNT).contains(&self.word_count) {
            return Err(AppError::Validation(format!(
                "word_count must be between {MIN_WORD_COUNT} and {MAX_WORD_COUNT}, got {}",
                self.word_count
            )));
        }
        Ok(())
    }
}

/// Request body for continuing (regenerating) an existing lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationRequest {
    pub previous_lesson: Lesson,
    pub continuation_prompt: String,
}

impl ContinuationRequest {
    /// Length is counted on the instruction as sent; whitespace-only text is
    /// rejected regardless of length.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.continuation_prompt.trim().is_empty() {
            return Err(AppError::Validation(
                "continuation_prompt cannot be empty".to_string(),
            ));
        }
        let chars = self.continuation_prompt.chars().count();
        if !(MIN_INSTRUCTION_CHARS..=MAX_INSTRUCTION_CHARS).contains(&chars) {
            return Err(AppError::Validation(format!(
                "continuation_prompt must be between {MIN_INSTRUCTION_CHARS} and \
                 {MAX_INSTRUCTION_CHARS} characters, got {chars}"
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lesson components
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    #[serde(default = "new_id")]
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("quiz question needs 2-5 options, got {0}")]
    OptionCount(usize),

    #[error("duplicate option id '{0}'")]
    DuplicateOptionId(String),

    #[error("correct_option_id '{0}' does not match any option")]
    UnknownCorrectOption(String),
}

/// A multiple-choice question.
///
/// Invariant: 2-5 options with distinct ids, and `correct_option_id` names
/// exactly one of them. Enforced by `new` and by deserialization, so a
/// `QuizItem` that exists is always answerable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizItemDraft")]
pub struct QuizItem {
    id: String,
    question: String,
    options: Vec<QuizOption>,
    correct_option_id: String,
}

#[derive(Deserialize)]
struct QuizItemDraft {
    #[serde(default = "new_id")]
    id: String,
    question: String,
    options: Vec<QuizOption>,
    correct_option_id: String,
}

impl TryFrom<QuizItemDraft> for QuizItem {
    type Error = QuizError;

    fn try_from(draft: QuizItemDraft) -> Result<Self, Self::Error> {
        QuizItem::new(
            draft.id,
            draft.question,
            draft.options,
            draft.correct_option_id,
        )
    }
}

impl QuizItem {
    pub fn new(
        id: String,
        question: String,
        options: Vec<QuizOption>,
        correct_option_id: String,
    ) -> Result<Self, QuizError> {
        if !(MIN_QUIZ_OPTIONS..=MAX_QUIZ_OPTIONS).contains(&options.len()) {
            return Err(QuizError::OptionCount(options.len()));
        }

        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.id.as_str()) {
                return Err(QuizError::DuplicateOptionId(option.id.clone()));
            }
        }

        if !seen.contains(correct_option_id.as_str()) {
            return Err(QuizError::UnknownCorrectOption(correct_option_id));
        }

        Ok(Self {
            id,
            question,
            options,
            correct_option_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Options in display order.
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    pub fn correct_option_id(&self) -> &str {
        &self.correct_option_id
    }

    pub fn correct_option(&self) -> &QuizOption {
        // `new` guarantees the id is present.
        self.options
            .iter()
            .find(|o| o.id == self.correct_option_id)
            .unwrap_or(&self.options[0])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generated lesson
// ────────────────────────────────────────────────────────────────────────────

/// A generated lesson. Produced once per successful pipeline run and never
/// mutated afterwards; a continuation yields a new `Lesson`.
///
/// `word_count` is always the whitespace-token count of `lesson_content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub lesson_content: String,
    pub academic_grade: String,
    pub subject: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub teacher_style: String,
    pub word_count: u32,
    pub language: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub vocabulary: Option<Vec<VocabularyItem>>,
    #[serde(default)]
    pub quiz: Option<Vec<QuizItem>>,
    #[serde(default)]
    pub learning_objectives: Option<Vec<String>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option(id: &str, text: &str) -> QuizOption {
        QuizOption {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn sample_request() -> GenerationRequest {
        serde_json::from_value(json!({ "academic_grade": "5", "subject": "Science" })).unwrap()
    }

    #[test]
    fn test_generation_request_defaults() {
        let request = sample_request();
        assert_eq!(request.teacher_style, TeacherStyle::Encouraging);
        assert_eq!(request.word_count, 300);
        assert_eq!(request.language, "English");
        assert!(request.include_summary);
        assert!(request.include_vocabulary);
        assert!(request.include_quiz);
        assert!(request.topic.is_none());
        assert!(request.user_prompt_addition.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_teacher_style_serde_uses_literal_names() {
        let style: TeacherStyle = serde_json::from_str(r#""Creative""#).unwrap();
        assert_eq!(style, TeacherStyle::Creative);
        assert_eq!(style.as_str(), "Creative");
        assert!(serde_json::from_str::<TeacherStyle>(r#""Sarcastic""#).is_err());
    }

    #[test]
    fn test_word_count_bounds_are_inclusive_51_to_2000() {
        let mut request = sample_request();

        request.word_count = 50;
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        request.word_count = 51;
        assert!(request.validate().is_ok());

        request.word_count = 2000;
        assert!(request.validate().is_ok());

        request.word_count = 2001;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_subject_is_rejected() {
        let mut request = sample_request();
        request.subject = "  ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_quiz_item_accepts_matching_correct_option() {
        let item = QuizItem::new(
            "q1".to_string(),
            "What do plants absorb?".to_string(),
            vec![option("a", "Sunlight"), option("b", "Gravel")],
            "a".to_string(),
        )
        .unwrap();
        assert_eq!(item.correct_option().text, "Sunlight");
        assert_eq!(item.options()[1].id, "b");
    }

    #[test]
    fn test_quiz_item_rejects_unknown_correct_option() {
        let result = QuizItem::new(
            "q1".to_string(),
            "Q?".to_string(),
            vec![option("a", "A"), option("b", "B")],
            "z".to_string(),
        );
        assert_eq!(
            result,
            Err(QuizError::UnknownCorrectOption("z".to_string()))
        );
    }

    #[test]
    fn test_quiz_item_rejects_option_counts_outside_2_to_5() {
        let one = QuizItem::new(
            "q".to_string(),
            "Q?".to_string(),
            vec![option("a", "A")],
            "a".to_string(),
        );
        assert_eq!(one, Err(QuizError::OptionCount(1)));

        let six: Vec<_> = (0..6).map(|i| option(&i.to_string(), "x")).collect();
        let too_many = QuizItem::new("q".to_string(), "Q?".to_string(), six, "0".to_string());
        assert_eq!(too_many, Err(QuizError::OptionCount(6)));
    }

    #[test]
    fn test_quiz_item_rejects_duplicate_option_ids() {
        let result = QuizItem::new(
            "q".to_string(),
            "Q?".to_string(),
            vec![option("a", "A"), option("a", "B")],
            "a".to_string(),
        );
        assert_eq!(result, Err(QuizError::DuplicateOptionId("a".to_string())));
    }

    #[test]
    fn test_quiz_item_deserialization_enforces_invariant() {
        let bad = json!({
            "id": "q1",
            "question": "Q?",
            "options": [{ "id": "a", "text": "A" }, { "id": "b", "text": "B" }],
            "correct_option_id": "c"
        });
        assert!(serde_json::from_value::<QuizItem>(bad).is_err());

        let good = json!({
            "question": "Q?",
            "options": [{ "id": "a", "text": "A" }, { "id": "b", "text": "B" }],
            "correct_option_id": "b"
        });
        let item: QuizItem = serde_json::from_value(good).unwrap();
        assert!(!item.id().is_empty(), "missing question id is generated");
    }

    #[test]
    fn test_continuation_instruction_length_bounds() {
        let lesson: Lesson = serde_json::from_value(json!({
            "title": "T",
            "lesson_content": "body",
            "academic_grade": "5",
            "subject": "Science",
            "teacher_style": "Direct",
            "word_count": 1,
            "language": "English"
        }))
        .unwrap();

        let mut request = ContinuationRequest {
            previous_lesson: lesson,
            continuation_prompt: "too short".to_string(),
        };
        assert!(request.validate().is_err());

        request.continuation_prompt = "Add a section about photosynthesis.".to_string();
        assert!(request.validate().is_ok());

        request.continuation_prompt = "x".repeat(501);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_continuation_instruction_length_counts_raw_text() {
        let mut request = ContinuationRequest {
            previous_lesson: crate::lessons::testing::sample_lesson(),
            continuation_prompt: "   more   ".to_string(),
        };
        assert!(request.validate().is_ok());

        request.continuation_prompt = " ".repeat(12);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_lesson_defaults_id_and_optional_fields() {
        let lesson: Lesson = serde_json::from_value(json!({
            "title": "T",
            "lesson_content": "body",
            "academic_grade": "5",
            "subject": "Science",
            "teacher_style": "Direct",
            "word_count": 1,
            "language": "English"
        }))
        .unwrap();
        assert!(lesson.summary.is_none());
        assert!(lesson.vocabulary.is_none());
        assert!(lesson.quiz.is_none());
        assert!(lesson.learning_objectives.is_none());
    }
}
