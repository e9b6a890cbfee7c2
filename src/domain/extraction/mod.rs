//! Extraction protocol: prompt construction and response recovery.
//!
//! Both halves are pure; the gateway call sits in `usecases::ExtractionService`.

pub mod prompt;
pub mod recovery;

pub use prompt::{
    extraction_prompt, extraction_request, EXTRACTION_MAX_TOKENS, EXTRACTION_SYSTEM_MESSAGE,
    EXTRACTION_TEMPERATURE,
};
pub use recovery::{locate_candidate, recover_profile, response_preview, Recognizer};
