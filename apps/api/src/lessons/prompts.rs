//! Prompt Builder: turns lesson requests into (system, user) prompt pairs.
//!
//! Everything here is a pure function of its input: no clock, no randomness,
//! no I/O. Identical requests produce byte-identical prompts.

use serde_json::Value;

use crate::errors::AppError;
use crate::lessons::models::{ContinuationRequest, GenerationRequest};
use crate::llm_client::prompts::{JSON_ONLY_REMINDER, JSON_ONLY_SYSTEM};

/// Prompts for one LLM call, plus the schema description embedded in `system`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPrompts {
    pub system: String,
    pub user: String,
    pub schema: String,
}

/// Which optional lesson components the output schema asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalComponents {
    pub summary: bool,
    pub vocabulary: bool,
    pub quiz: bool,
}

impl OptionalComponents {
    pub const ALL: Self = Self {
        summary: true,
        vocabulary: true,
        quiz: true,
    };

    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            summary: request.include_summary,
            vocabulary: request.include_vocabulary,
            quiz: request.include_quiz,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static text
// ────────────────────────────────────────────────────────────────────────────

/// Persona descriptions keyed by teacher style name.
const STYLE_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "Encouraging",
        "warm and encouraging, a little informal, leans on analogies and everyday \
         examples, and builds the student's confidence step by step.",
    ),
    (
        "Structured",
        "clear and methodical, explains one step at a time, highlights key terms and \
         definitions, and keeps a slightly formal tone.",
    ),
    (
        "Creative",
        "imaginative and conversational, frames ideas as stories or scenarios, and \
         connects concepts in surprising ways.",
    ),
    (
        "Direct",
        "concise and to the point, sticks to the essential facts, and skips filler.",
    ),
];

const GENERIC_STYLE_DESCRIPTION: &str = "a clear, standard educational style.";

const SYSTEM_PREAMBLE: &str = "You are an expert educational content writer. \
You write clear, engaging, well-structured lessons for the audience and teaching style you are given.
Include every field listed in the output schema below and no fields that are not listed.
Write the lesson_content field in Markdown.
Give every question and every answer option a unique id.
Echo academic_grade, subject, topic, teacher_style and language exactly as requested.";

const STRUCTURE_INSTRUCTIONS: &[&str] = &[
    "Explain the core ideas clearly and engagingly in the requested teaching style.",
    "Organize the lesson logically: introduction, explanation, worked examples, conclusion. Use Markdown.",
    "Speak to the student directly (use \"you\").",
];

const CONTINUATION_RULES: &[&str] = &[
    "Regenerate the ENTIRE lesson, not just the parts that change:",
    "- Apply the instruction to the previous lesson's content, summary, vocabulary and quiz.",
    "- Keep the original grade, subject, topic, teaching style and language unless the instruction changes them, and echo them back.",
    "- Return every field of the output schema, including title and lesson_content.",
    "- Give any new questions or answer options fresh unique ids.",
];

/// Returns the persona description for a style name, or a generic one.
pub fn style_description(style: &str) -> &'static str {
    STYLE_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == style)
        .map(|(_, description)| *description)
        .unwrap_or(GENERIC_STYLE_DESCRIPTION)
}

// ────────────────────────────────────────────────────────────────────────────
// Schema + system prompt
// ────────────────────────────────────────────────────────────────────────────

/// Ordered (field, description) pairs for the output schema.
fn schema_fields(components: OptionalComponents) -> Vec<(&'static str, &'static str)> {
    let mut fields = vec![
        ("title", "string (clear, engaging lesson title, at most 15 words)"),
        (
            "lesson_content",
            "string (the full lesson in Markdown with headings, lists and bold; \
             separate paragraphs with a blank line; stay close to the requested length)",
        ),
        (
            "learning_objectives",
            "[string] (3-5 measurable objectives, each starting with an action verb)",
        ),
    ];
    if components.summary {
        fields.push((
            "summary",
            "string (2-3 sentence summary of the core ideas)",
        ));
    }
    if components.vocabulary {
        fields.push((
            "vocabulary",
            "[{\"term\": string, \"definition\": string}] (3-5 key terms from the lesson \
             with grade-appropriate definitions)",
        ));
    }
    if components.quiz {
        fields.push((
            "quiz",
            "[{\"id\": string, \"question\": string, \"options\": [{\"id\": string, \
             \"text\": string}], \"correct_option_id\": string}] (3-5 multiple-choice \
             questions answerable from the lesson alone, 3-4 options each; \
             correct_option_id must equal the id of one of its options)",
        ));
    }
    fields.extend([
        ("academic_grade", "string (echo the requested grade)"),
        ("subject", "string (echo the requested subject)"),
        ("topic", "string or null (echo the requested topic)"),
        ("teacher_style", "string (echo the requested teaching style)"),
        ("language", "string (echo the requested language)"),
        (
            "word_count",
            "integer (approximate word count of lesson_content)",
        ),
    ]);
    fields
}

/// Renders the output schema as a JSON-shaped description, one field per line.
pub fn schema_description(components: OptionalComponents) -> String {
    let lines: Vec<String> = schema_fields(components)
        .into_iter()
        .map(|(field, description)| {
            format!(
                "  {}: {}",
                Value::from(field),
                Value::from(description)
            )
        })
        .collect();
    format!("{{\n{}\n}}", lines.join(",\n"))
}

fn system_prompt(schema: &str) -> String {
    format!("{SYSTEM_PREAMBLE}\n{JSON_ONLY_SYSTEM}\n\nOutput schema:\n{schema}\n")
}

// ────────────────────────────────────────────────────────────────────────────
// User prompts
// ────────────────────────────────────────────────────────────────────────────

/// Builds the prompts for a fresh lesson.
///
/// User prompt order: framing, style, audience, subject, topic, length,
/// structure, optional components, teacher addition, JSON reminder.
pub fn build_generation_prompts(request: &GenerationRequest) -> LessonPrompts {
    let components = OptionalComponents::from_request(request);
    let schema = schema_description(components);
    let style = request.teacher_style.as_str();

    let mut lines = vec![
        format!(
            "Write an educational lesson in {} using the {} teaching style.",
            request.language, style
        ),
        format!("Teaching style: {}", style_description(style)),
        format!("Audience: grade {} students.", request.academic_grade),
        format!("Subject: {}.", request.subject),
    ];

    if let Some(topic) = request.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        lines.push(format!("Topic: {topic}."));
    }

    lines.push(format!(
        "Target length: about {} words of lesson content.",
        request.word_count
    ));
    lines.extend(STRUCTURE_INSTRUCTIONS.iter().map(|s| s.to_string()));

    let mut requested = Vec::new();
    if components.summary {
        requested.push("- A short summary of the lesson (field 'summary').");
    }
    if components.vocabulary {
        requested.push("- 3-5 key vocabulary terms with definitions (field 'vocabulary').");
    }
    if components.quiz {
        requested.push(
            "- 3-5 multiple-choice questions with 3-4 options each, based on the lesson (field 'quiz').",
        );
    }
    if !requested.is_empty() {
        lines.push("\nInclude these optional components:".to_string());
        lines.extend(requested.into_iter().map(String::from));
    }

    if let Some(addition) = request
        .user_prompt_addition
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        lines.push(format!("\nAdditional instructions from the teacher:\n{addition}"));
    }

    lines.push(format!("\n{JSON_ONLY_REMINDER}"));

    LessonPrompts {
        system: system_prompt(&schema),
        user: lines.join("\n"),
        schema,
    }
}

/// Builds the prompts for regenerating a lesson from a previous one.
///
/// The previous lesson is embedded in full, optional fields included, and the
/// schema always asks for every optional component.
pub fn build_continuation_prompts(request: &ContinuationRequest) -> Result<LessonPrompts, AppError> {
    let schema = schema_description(OptionalComponents::ALL);

    let previous_json = serde_json::to_string_pretty(&request.previous_lesson).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to serialize previous lesson: {e}"))
    })?;

    let mut lines = vec![
        "Revise an existing lesson according to the teacher's instruction.".to_string(),
        String::new(),
        "Previous lesson (JSON):".to_string(),
        "```json".to_string(),
        previous_json,
        "```".to_string(),
        String::new(),
        "Instruction:".to_string(),
        "\"\"\"".to_string(),
        request.continuation_prompt.trim().to_string(),
        "\"\"\"".to_string(),
        String::new(),
    ];
    lines.extend(CONTINUATION_RULES.iter().map(|s| s.to_string()));
    lines.push(format!("\n{JSON_ONLY_REMINDER}"));

    Ok(LessonPrompts {
        system: system_prompt(&schema),
        user: lines.join("\n"),
        schema,
    })
}
