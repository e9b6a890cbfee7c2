//! Ingestion use case. Orchestrates document -> extraction -> profile store.
//!
//! Documents are processed one at a time; each call is independent and holds no state.

use crate::domain::{DomainError, ExtractionRequest, IngestEvent, IngestStage, Profile};
use crate::ports::{ProfileStore, ProgressPort};
use crate::usecases::ExtractionService;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub profile: Profile,
    /// False when an existing profile with the same `user_id` was updated.
    pub created: bool,
}

/// Service for file-based profile ingestion.
///
/// Orchestrates the flow:
/// 1. Read the document (UTF-8)
/// 2. Extract a `ProfileDraft` through the LLM
/// 3. Upsert it into the profile store
pub struct IngestionService {
    extraction: Arc<ExtractionService>,
    store: Arc<dyn ProfileStore>,
    progress: Arc<dyn ProgressPort>,
}

impl IngestionService {
    pub fn new(
        extraction: Arc<ExtractionService>,
        store: Arc<dyn ProfileStore>,
        progress: Arc<dyn ProgressPort>,
    ) -> Self {
        Self {
            extraction,
            store,
            progress,
        }
    }

    /// Ingest one file. Every failure is reported to the progress port and returned.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestionOutcome, DomainError> {
        let raw_text = match read_document(path).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(IngestStage::Extract, e)),
        };
        self.progress.report(IngestEvent::Extracting {
            path: path.to_path_buf(),
            bytes: raw_text.len(),
        });

        let draft = match self
            .extraction
            .extract(&ExtractionRequest::new(raw_text))
            .await
        {
            Ok(draft) => draft,
            Err(e) => return Err(self.fail(IngestStage::Extract, e)),
        };
        self.progress.report(IngestEvent::Extracted {
            draft: draft.clone(),
        });

        self.progress.report(IngestEvent::Saving);
        let (profile, created) = match self.store.upsert(&draft).await {
            Ok(saved) => saved,
            Err(e) => return Err(self.fail(IngestStage::Save, e)),
        };
        info!(
            path = %path.display(),
            user_id = %profile.user_id,
            id = profile.id,
            created,
            "ingestion complete"
        );
        self.progress.report(IngestEvent::Saved {
            profile: profile.clone(),
            created,
        });

        Ok(IngestionOutcome { profile, created })
    }

    fn fail(&self, stage: IngestStage, e: DomainError) -> DomainError {
        error!(%stage, error = %e, "ingestion failed");
        self.progress.report(IngestEvent::Failed {
            stage,
            message: e.to_string(),
        });
        e
    }
}

/// Read a source document. Missing files and non-UTF-8 content are `Document` errors.
pub async fn read_document(path: &Path) -> Result<String, DomainError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DomainError::Document(format!("File not found: {}", path.display()))
        } else {
            DomainError::Document(format!("Failed to read {}: {}", path.display(), e))
        }
    })
}
