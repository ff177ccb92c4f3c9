//! Response Parser: turns raw model text into validated lesson fields.
//!
//! Stages: raw text → JSON object (fence stripping + strict decode) →
//! mandatory-key check → typed fields. The accepted coercions are:
//!
//! - option / question ids given as JSON integers become their decimal string
//! - a missing option or question id gets a fresh UUID
//! - the correct-answer reference must name an option id; only when the model
//!   declared no option ids may it be a 0-based index (integer or numeric string)
//! - surrounding whitespace is trimmed from text fields
//!
//! Anything else that does not fit is dropped, never half-applied.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::lessons::models::{new_id, QuizItem, QuizOption, VocabularyItem};
use crate::lessons::prompts::OptionalComponents;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid AI output format: {0}")]
    InvalidJson(String),

    #[error("Invalid AI output format: expected a JSON object")]
    NotAnObject,

    #[error("AI response missing required field '{0}'")]
    MissingField(&'static str),
}

/// Which flow produced the model output. Decides the mandatory keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Generation,
    Continuation,
}

/// Alternate content key some models use when continuing a lesson.
const CONTINUATION_CONTENT_KEY: &str = "continuation_content";

/// Typed fields pulled out of one model response.
///
/// Echoed request parameters are `None` when the model omitted them; the
/// content service decides what to fall back to.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonFields {
    pub title: Option<String>,
    pub lesson_content: String,
    /// Whitespace-token count of `lesson_content`. The model's own figure is ignored.
    pub word_count: u32,
    pub summary: Option<String>,
    pub vocabulary: Option<Vec<VocabularyItem>>,
    pub quiz: Option<Vec<QuizItem>>,
    pub learning_objectives: Option<Vec<String>>,
    pub academic_grade: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub teacher_style: Option<String>,
    pub language: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Cleaning + decoding
// ────────────────────────────────────────────────────────────────────────────

/// Strips one ```json ... ``` or ``` ... ``` wrapper, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let body = body.trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

/// Decodes raw model text into a JSON object.
///
/// The raw text is only ever logged at debug level; the returned error never
/// contains it.
pub fn parse_ai_json(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let cleaned = strip_code_fence(raw);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        warn!("Failed to decode AI output as JSON: {e}");
        debug!("Raw AI output: {raw}");
        ParseError::InvalidJson(e.to_string())
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => {
            debug!("Raw AI output: {raw}");
            Err(ParseError::NotAnObject)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mandatory keys
// ────────────────────────────────────────────────────────────────────────────

fn non_blank_text(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn content_of(data: &Map<String, Value>, kind: ResponseKind) -> Option<String> {
    match kind {
        ResponseKind::Generation => non_blank_text(data, "lesson_content"),
        ResponseKind::Continuation => non_blank_text(data, "lesson_content")
            .or_else(|| non_blank_text(data, CONTINUATION_CONTENT_KEY)),
    }
}

/// Checks that the keys the flow cannot do without are present as text.
///
/// Generation needs `title` and `lesson_content`; continuation needs
/// `lesson_content` (or `continuation_content`).
pub fn validate_required(data: &Map<String, Value>, kind: ResponseKind) -> Result<(), ParseError> {
    if kind == ResponseKind::Generation && non_blank_text(data, "title").is_none() {
        return Err(ParseError::MissingField("title"));
    }
    if content_of(data, kind).is_none() {
        return Err(ParseError::MissingField("lesson_content"));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Field extraction
// ────────────────────────────────────────────────────────────────────────────

pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

fn preview(text: &str) -> String {
    text.chars().take(60).collect()
}

/// Keeps entries that have both a term and a definition, up to `limit`.
/// Returns `None` when nothing valid remains.
pub fn extract_vocabulary(value: Option<&Value>, limit: Option<usize>) -> Option<Vec<VocabularyItem>> {
    let entries = match value? {
        Value::Array(entries) => entries,
        Value::Null => return None,
        _ => {
            warn!("Ignoring vocabulary: expected a list");
            return None;
        }
    };

    let mut items = Vec::new();
    for entry in entries {
        if limit.is_some_and(|max| items.len() >= max) {
            break;
        }
        let term = entry.get("term").and_then(Value::as_str).map(str::trim);
        let definition = entry.get("definition").and_then(Value::as_str).map(str::trim);
        match (term, definition) {
            (Some(term), Some(definition)) if !term.is_empty() && !definition.is_empty() => {
                items.push(VocabularyItem {
                    term: term.to_string(),
                    definition: definition.to_string(),
                });
            }
            _ => {
                warn!("Dropping vocabulary entry without term and definition");
                debug!("Dropped vocabulary entry: {entry}");
            }
        }
    }

    (!items.is_empty()).then_some(items)
}

/// Reads an id that may arrive as a string or an integer.
fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

fn parse_option(value: &Value) -> Option<QuizOption> {
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    Some(QuizOption {
        id: id_value(value.get("id")).unwrap_or_else(new_id),
        text: text.to_string(),
    })
}

/// Resolves the correct-answer reference against the final option ids.
///
/// Once the model declared any option id, the reference must name one of
/// them. Index lookup only applies when every id was generated here.
fn resolve_correct_option(
    reference: &Value,
    options: &[QuizOption],
    ids_declared: bool,
) -> Option<String> {
    let by_id = |id: &str| options.iter().find(|o| o.id == id).map(|o| o.id.clone());
    let by_index = |index: usize| options.get(index).map(|o| o.id.clone());

    let (id, index) = match reference {
        Value::String(s) => {
            let s = s.trim();
            (s.to_string(), s.parse::<usize>().ok())
        }
        Value::Number(n) => {
            let index = n.as_u64()?;
            (index.to_string(), usize::try_from(index).ok())
        }
        _ => return None,
    };

    if ids_declared {
        by_id(&id)
    } else {
        by_id(&id).or_else(|| index.and_then(by_index))
    }
}

fn parse_quiz_item(value: &Value) -> Result<QuizItem, String> {
    let question = value
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or("missing question text")?;

    let raw_options = value
        .get("options")
        .and_then(Value::as_array)
        .filter(|o| !o.is_empty())
        .ok_or("missing options")?;

    let reference = value
        .get("correct_option_id")
        .or_else(|| value.get("correct_answer"))
        .filter(|r| !r.is_null())
        .ok_or("missing correct answer reference")?;

    let options: Vec<QuizOption> = raw_options
        .iter()
        .filter_map(|raw| {
            let option = parse_option(raw);
            if option.is_none() {
                warn!("Dropping quiz option without text");
                debug!("Dropped quiz option: {raw}");
            }
            option
        })
        .collect();

    if options.is_empty() {
        return Err("no valid options".to_string());
    }

    let ids_declared = raw_options.iter().any(|raw| id_value(raw.get("id")).is_some());
    let correct_option_id = resolve_correct_option(reference, &options, ids_declared)
        .ok_or_else(|| format!("correct answer '{reference}' matches no option"))?;

    QuizItem::new(
        id_value(value.get("id")).unwrap_or_else(new_id),
        question.to_string(),
        options,
        correct_option_id,
    )
    .map_err(|e| e.to_string())
}

/// Keeps every question that yields a valid `QuizItem`; drops the rest.
/// Returns `None` when nothing valid remains.
pub fn extract_quiz(value: Option<&Value>) -> Option<Vec<QuizItem>> {
    let entries = match value? {
        Value::Array(entries) => entries,
        Value::Null => return None,
        _ => {
            warn!("Ignoring quiz: expected a list");
            return None;
        }
    };

    let items: Vec<QuizItem> = entries
        .iter()
        .filter_map(|entry| match parse_quiz_item(entry) {
            Ok(item) => Some(item),
            Err(reason) => {
                let question = entry.get("question").and_then(Value::as_str).unwrap_or("");
                warn!(
                    "Dropping quiz question ({reason}): {:?}",
                    preview(question)
                );
                None
            }
        })
        .collect();

    (!items.is_empty()).then_some(items)
}

pub fn extract_learning_objectives(value: Option<&Value>) -> Option<Vec<String>> {
    let objectives: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    (!objectives.is_empty()).then_some(objectives)
}

/// Extracts typed fields from a decoded response.
///
/// Optional components not listed in `components` are left `None` even when
/// the model sent them.
pub fn extract_lesson_fields(
    data: &Map<String, Value>,
    kind: ResponseKind,
    components: OptionalComponents,
    vocabulary_limit: Option<usize>,
) -> Result<LessonFields, ParseError> {
    validate_required(data, kind)?;
    let lesson_content = content_of(data, kind).ok_or(ParseError::MissingField("lesson_content"))?;

    if let Some(reported) = data.get("word_count") {
        debug!("Discarding model-reported word_count {reported}");
    }

    Ok(LessonFields {
        title: non_blank_text(data, "title"),
        word_count: count_words(&lesson_content),
        lesson_content,
        summary: components
            .summary
            .then(|| non_blank_text(data, "summary"))
            .flatten(),
        vocabulary: components
            .vocabulary
            .then(|| extract_vocabulary(data.get("vocabulary"), vocabulary_limit))
            .flatten(),
        quiz: components
            .quiz
            .then(|| extract_quiz(data.get("quiz")))
            .flatten(),
        learning_objectives: extract_learning_objectives(data.get("learning_objectives")),
        academic_grade: non_blank_text(data, "academic_grade"),
        subject: non_blank_text(data, "subject"),
        topic: non_blank_text(data, "topic"),
        teacher_style: non_blank_text(data, "teacher_style"),
        language: non_blank_text(data, "language"),
    })
}
