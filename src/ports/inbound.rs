//! Inbound port. The application reports back to the UI (adapter).

use crate::domain::IngestEvent;

/// Receives ingestion progress. Console adapter prints it; tests record it.
pub trait ProgressPort: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Discards all events.
pub struct SilentProgress;

impl ProgressPort for SilentProgress {
    fn report(&self, _event: IngestEvent) {}
}
