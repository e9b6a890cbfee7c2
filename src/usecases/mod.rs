//! Application use cases. Orchestrate domain logic via ports.

pub mod chat_service;
pub mod extraction_service;
pub mod ingestion_service;
pub mod profile_service;

pub use chat_service::{ChatInput, ChatReply, ChatService};
pub use extraction_service::ExtractionService;
pub use ingestion_service::{read_document, IngestionOutcome, IngestionService};
pub use profile_service::ProfileService;
