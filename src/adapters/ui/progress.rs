//! Console progress for `social-os ingest`. Implements ProgressPort.
//!
//! Prints a step-by-step report to stdout and shows a spinner on stderr while the
//! LLM call is in flight.

use crate::domain::IngestEvent;
use crate::ports::ProgressPort;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const RULE: &str = "============================================================";
/// Characters of the bio shown in the report.
const BIO_PREVIEW_CHARS: usize = 80;

pub struct ConsoleProgress {
    verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            spinner: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("   {spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn stop_spinner(&self) {
        if let Some(pb) = self.spinner.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pb.finish_and_clear();
        }
    }
}

/// Render one event as report lines. Kept separate from printing for testing.
pub fn render_event(event: &IngestEvent, verbose: bool) -> Vec<String> {
    match event {
        IngestEvent::Started { path } => vec![
            String::new(),
            RULE.to_string(),
            "STARTING USER INGESTION".to_string(),
            RULE.to_string(),
            String::new(),
            format!("Source: {}", path.display()),
            "Step 1: Ensuring database is ready...".to_string(),
        ],
        IngestEvent::StoreReady => vec!["✓ Database tables verified/created".to_string()],
        IngestEvent::Extracting { path, bytes } => vec![
            String::new(),
            format!("Step 2: Processing file: {} ({} bytes)", path.display(), bytes),
            "   This will use the LLM to extract user profile data...".to_string(),
        ],
        IngestEvent::Extracted { draft } => {
            let bio = draft.bio.as_deref().unwrap_or("N/A");
            let mut bio_preview: String = bio.chars().take(BIO_PREVIEW_CHARS).collect();
            if bio.chars().count() > BIO_PREVIEW_CHARS {
                bio_preview.push_str("...");
            }
            let mut lines = vec![
                format!("✓ Successfully extracted user data for: {}", draft.name),
                format!("   User ID: {}", draft.user_id),
                format!("   Bio: {}", bio_preview),
            ];
            if verbose {
                let wiki_len = draft.wiki_content.as_deref().map_or(0, str::len);
                lines.push(format!("   Wiki content: {} bytes", wiki_len));
            }
            lines
        }
        IngestEvent::Saving => vec![
            String::new(),
            "Step 3: Saving user profile to database...".to_string(),
        ],
        IngestEvent::Saved { profile, created } => vec![
            format!(
                "✓ Successfully {} user: {}",
                if *created { "created" } else { "updated" },
                profile.name
            ),
            format!("   Database ID: {}", profile.id),
            format!("   User ID: {}", profile.user_id),
            format!("   Created: {}", profile.created_at.to_rfc3339()),
            format!("   Updated: {}", profile.updated_at.to_rfc3339()),
        ],
        IngestEvent::Failed { stage, message } => {
            vec![format!("✗ Error during {} step: {}", stage, message)]
        }
        IngestEvent::Finished => vec![
            String::new(),
            RULE.to_string(),
            "INGESTION COMPLETE".to_string(),
            RULE.to_string(),
            String::new(),
        ],
    }
}

impl ProgressPort for ConsoleProgress {
    fn report(&self, event: IngestEvent) {
        if !matches!(event, IngestEvent::Extracting { .. }) {
            self.stop_spinner();
        }
        for line in render_event(&event, self.verbose) {
            println!("{}", line);
        }
        if matches!(event, IngestEvent::Extracting { .. }) {
            self.start_spinner("waiting for LLM response");
        }
    }
}
