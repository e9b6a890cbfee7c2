//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// No credentials or configuration for the LLM provider.
    #[error("LLM gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Network or provider failure, propagated untouched.
    #[error("LLM gateway call failed: {0}")]
    GatewayCallFailed(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// Candidate text is not a JSON object. `preview` is a bounded excerpt of the raw response.
    #[error("LLM did not return valid JSON ({reason}). Response: {preview}")]
    MalformedResponse { reason: String, preview: String },

    #[error("LLM response violates the profile schema: field '{field}' {reason}")]
    SchemaViolation { field: String, reason: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repo(String),
}

impl DomainError {
    /// True when the caller, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound(_) | DomainError::Conflict(_) | DomainError::Validation(_)
        )
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        DomainError::SchemaViolation {
            field: field.to_string(),
            reason: "is missing".to_string(),
        }
    }
}
