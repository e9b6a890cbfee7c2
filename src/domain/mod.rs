//! Core domain layer. No network or database dependencies.
//!
//! Entities, errors and the extraction protocol live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod extraction;

pub use entities::{
    CompletionRequest, ExtractionRequest, IngestEvent, IngestStage, Profile, ProfileDraft,
    ProfileSummary, ProfileUpdate,
};
pub use errors::DomainError;
