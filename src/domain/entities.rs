//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/SQL types here; adapters map to and from these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// System message used when a caller does not supply one.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";
/// Output ceiling used when a caller does not supply one.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
/// Sampling temperature used when a caller does not supply one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Validated, unpersisted profile produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub wiki_content: Option<String>,
}

impl ProfileDraft {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            bio: None,
            wiki_content: None,
        }
    }
}

/// Persisted profile. Serialized camelCase at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Internal row identifier; stable across upserts.
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub wiki_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List view of a profile (no wiki content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
}

impl From<Profile> for ProfileSummary {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name,
            bio: p.bio,
        }
    }
}

/// Partial update. An absent field (`None`) leaves the stored value untouched.
/// For the optional fields an explicit JSON `null` (`Some(None)`) clears the value.
/// `name` is required on a profile, so a `null` name is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub bio: Option<Option<String>>,
    #[serde(
        default,
        alias = "wikiContent",
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub wiki_content: Option<Option<String>>,
}

impl ProfileUpdate {
    /// True when the update names no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.wiki_content.is_none()
    }
}

/// Marks a field as present, keeping `null` distinct from a missing key.
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// One source document to extract a profile from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Full document contents, embedded verbatim in the prompt.
    pub raw_text: String,
}

impl ExtractionRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// Everything the gateway needs for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_message: String,
    pub prompt: String,
    /// Model to use instead of the gateway's configured default.
    pub model_override: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Request with the generic assistant defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            prompt: prompt.into(),
            model_override: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Ingestion stage, used in progress events and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    Store,
    Extract,
    Save,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IngestStage::Store => "store",
            IngestStage::Extract => "extract",
            IngestStage::Save => "save",
        };
        f.write_str(s)
    }
}

/// Progress of a single-document ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    Started { path: PathBuf },
    StoreReady,
    Extracting { path: PathBuf, bytes: usize },
    Extracted { draft: ProfileDraft },
    Saving,
    Saved { profile: Profile, created: bool },
    Failed { stage: IngestStage, message: String },
    Finished,
}
