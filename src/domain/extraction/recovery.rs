//! Recover a `ProfileDraft` from a noisy LLM response.
//!
//! Candidate location is an ordered list of recognizers (tagged fence, generic fence,
//! raw text); the first one that matches wins. The candidate is parsed into a generic
//! JSON map and the profile fields are projected out with explicit presence checks.
//!
//! Only the first fence pair is considered. A response holding several fenced blocks
//! (say an example followed by the real answer) is not disambiguated.

use crate::domain::{DomainError, ProfileDraft};
use serde_json::{Map, Value};
use tracing::debug;

/// Fence marker shared by both fence recognizers.
const FENCE: &str = "```";
/// Opening marker of a fence explicitly tagged as JSON.
const JSON_FENCE: &str = "```json";
/// Prefix the gateway uses for its own error reports.
pub const GATEWAY_ERROR_PREFIX: &str = "Error:";
/// Characters of the raw response kept in error previews.
pub const PREVIEW_CHARS: usize = 200;

/// Strategy for locating the JSON candidate inside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognizer {
    /// Body of the first ```json fence.
    TaggedFence,
    /// Body of the first ``` fence, any tag.
    GenericFence,
    /// The whole (trimmed) response.
    RawText,
}

/// Recognizers in the order they are tried.
pub const RECOGNIZERS: [Recognizer; 3] = [
    Recognizer::TaggedFence,
    Recognizer::GenericFence,
    Recognizer::RawText,
];

impl Recognizer {
    /// Candidate for this strategy, or `None` when the strategy does not apply.
    pub fn recognize<'a>(&self, text: &'a str) -> Option<&'a str> {
        match self {
            Recognizer::TaggedFence => fenced_body(text, JSON_FENCE),
            Recognizer::GenericFence => fenced_body(text, FENCE),
            Recognizer::RawText => Some(text.trim()),
        }
    }
}

/// Text between the first `open` marker and the next closing fence, trimmed.
/// An unclosed fence (truncated output) yields everything after the marker.
fn fenced_body<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let rest = &text[start..];
    let body = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(body.trim())
}

/// First matching recognizer and its candidate.
pub fn locate_candidate(text: &str) -> (Recognizer, &str) {
    RECOGNIZERS
        .iter()
        .find_map(|r| r.recognize(text).map(|c| (*r, c)))
        .unwrap_or((Recognizer::RawText, text.trim()))
}

/// Bounded excerpt of a response for error messages and logs.
pub fn response_preview(raw: &str) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// True when the text is the gateway's own error report rather than model output.
pub fn is_gateway_sentinel(text: &str) -> bool {
    text.trim_start().starts_with(GATEWAY_ERROR_PREFIX)
}

/// Full recovery: trim, short-circuit sentinels, locate, parse, validate.
pub fn recover_profile(raw: &str) -> Result<ProfileDraft, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyResponse);
    }
    if is_gateway_sentinel(trimmed) {
        return Err(DomainError::GatewayCallFailed(trimmed.to_string()));
    }

    let (recognizer, candidate) = locate_candidate(trimmed);
    debug!(
        ?recognizer,
        candidate_len = candidate.len(),
        "located JSON candidate"
    );
    parse_profile_draft(candidate, raw)
}

/// Parse `candidate` into a draft. `raw` is only used for the error preview.
pub fn parse_profile_draft(candidate: &str, raw: &str) -> Result<ProfileDraft, DomainError> {
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| DomainError::MalformedResponse {
            reason: e.to_string(),
            preview: response_preview(raw),
        })?;

    let obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(DomainError::MalformedResponse {
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
                preview: response_preview(raw),
            });
        }
    };

    Ok(ProfileDraft {
        user_id: required_str(&obj, "user_id")?,
        name: required_str(&obj, "name")?,
        bio: optional_str(&obj, "bio")?,
        wiki_content: optional_str(&obj, "wiki_content")?,
    })
}

fn required_str(obj: &Map<String, Value>, field: &str) -> Result<String, DomainError> {
    match obj.get(field) {
        None => Err(DomainError::missing_field(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(wrong_type(field, other)),
    }
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, DomainError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(field, other)),
    }
}

fn wrong_type(field: &str, value: &Value) -> DomainError {
    DomainError::SchemaViolation {
        field: field.to_string(),
        reason: format!("must be a string, found {}", json_kind(value)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
