// Shared prompt fragments.
// Lesson-specific templates live in lessons/prompts.rs; this file only holds
// the pieces every JSON-producing call needs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "Your response MUST be a single, valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing line appended to every user prompt.
pub const JSON_ONLY_REMINDER: &str = "Respond with ONLY the single JSON object described in \
    the system prompt, echoing back the requested parameters.";
