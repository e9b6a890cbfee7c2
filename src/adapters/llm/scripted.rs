//! Scripted gateway for tests and offline development.
//!
//! Replays queued outcomes in order without making network calls.

use crate::domain::{CompletionRequest, DomainError};
use crate::ports::LlmGateway;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Deterministic `LlmGateway` double.
///
/// Outcomes are consumed front to back; once the queue is empty the fallback
/// response (if any) is returned for every call. Every request is recorded.
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<String, DomainError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
    /// Simulated network delay.
    delay: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Gateway that answers every call with `response`.
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_outcomes().push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: DomainError) {
        self.lock_outcomes().push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_outcomes(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, DomainError>>> {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmGateway for ScriptedGateway {
    async fn send(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        info!(
            prompt_len = request.prompt.len(),
            "[SCRIPTED] Simulating completion"
        );
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.lock_outcomes().pop_front();
        match next {
            Some(outcome) => outcome,
            None => self.fallback.clone().ok_or_else(|| {
                DomainError::GatewayCallFailed("no scripted response left".to_string())
            }),
        }
    }

    fn default_model(&self) -> &str {
        "scripted/model"
    }
}
