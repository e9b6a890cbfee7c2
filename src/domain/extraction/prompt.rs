//! Prompt construction for profile extraction. Pure and deterministic.

use crate::domain::{CompletionRequest, ExtractionRequest};

/// Output ceiling sized for a multi-paragraph `wiki_content` field.
pub const EXTRACTION_MAX_TOKENS: u32 = 4096;
/// Low temperature keeps extraction close to deterministic.
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// Fixed instruction block declaring the output schema.
pub const EXTRACTION_SYSTEM_MESSAGE: &str = r#"You are a data extraction assistant for a user profile system.
Your task is to analyze interview transcripts or user profile documents and extract structured information.

You must return ONLY a valid JSON object with the following schema:
{
    "user_id": "a stable, machine-readable identifier (e.g., lowercase name with underscores)",
    "name": "the person's full name",
    "bio": "a concise one-line summary of who they are (50-100 characters)",
    "wiki_content": "a comprehensive markdown-formatted document containing all descriptive information about the person: background, skills, interests, projects, experiences, personality traits, goals, and any other relevant details. Organize it with headers and bullet points."
}

## Guidelines
1. wiki_content is the most important field: consolidate ALL descriptive text there.
2. Format wiki_content as clean Markdown with headers (##, ###) and bullet points.
3. Be thorough: include everything that helps understand this person.
4. user_id must be stable and machine-readable: lowercase letters, digits and underscores only (e.g. "jane_doe", "john_smith").
5. Keep bio very concise. It is a one-line tagline.
6. Return ONLY the JSON object. No additional text, explanation or commentary."#;

/// Per-document prompt. `raw_text` is embedded verbatim.
pub fn extraction_prompt(raw_text: &str) -> String {
    format!(
        "Please analyze the following text and extract user profile information according to the schema:\n\nTEXT TO ANALYZE:\n{}\n\nReturn the extracted information as a JSON object.",
        raw_text
    )
}

/// Gateway request for one extraction. Uses the gateway's default model.
pub fn extraction_request(request: &ExtractionRequest) -> CompletionRequest {
    CompletionRequest {
        system_message: EXTRACTION_SYSTEM_MESSAGE.to_string(),
        prompt: extraction_prompt(&request.raw_text),
        model_override: None,
        max_tokens: EXTRACTION_MAX_TOKENS,
        temperature: EXTRACTION_TEMPERATURE,
    }
}
