//! Extraction use case: one document in, one validated `ProfileDraft` out.
//!
//! Exactly one gateway call per extraction, bounded by a timeout. No retries; a caller
//! that wants them wraps this service.

use crate::domain::extraction::{extraction_request, recover_profile};
use crate::domain::{DomainError, ExtractionRequest, ProfileDraft};
use crate::ports::LlmGateway;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ExtractionService {
    gateway: Arc<dyn LlmGateway>,
    timeout: Duration,
}

impl ExtractionService {
    /// # Arguments
    /// * `gateway` - LLM gateway (OpenRouter, scripted, ...)
    /// * `timeout` - upper bound on the gateway call
    pub fn new(gateway: Arc<dyn LlmGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ProfileDraft, DomainError> {
        let completion = extraction_request(request);
        info!(
            text_len = request.raw_text.len(),
            model = %self.gateway.default_model(),
            "extracting profile"
        );

        let raw = tokio::time::timeout(self.timeout, self.gateway.send(&completion))
            .await
            .map_err(|_| {
                DomainError::GatewayCallFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        match recover_profile(&raw) {
            Ok(draft) => {
                info!(user_id = %draft.user_id, name = %draft.name, "profile extracted");
                Ok(draft)
            }
            Err(e) => {
                warn!(error = %e, "profile extraction failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::ScriptedGateway;
    use crate::domain::extraction::{EXTRACTION_MAX_TOKENS, EXTRACTION_SYSTEM_MESSAGE};

    fn service(gateway: Arc<ScriptedGateway>) -> ExtractionService {
        ExtractionService::new(gateway, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_extracts_fenced_profile() {
        let gateway = Arc::new(ScriptedGateway::always(
            "```json\n{\"user_id\":\"jane_doe\",\"name\":\"Jane Doe\"}\n```",
        ));
        let draft = service(gateway.clone())
            .extract(&ExtractionRequest::new("Jane Doe is a pilot."))
            .await
            .unwrap();
        assert_eq!(draft, ProfileDraft::new("jane_doe", "Jane Doe"));

        let sent = gateway.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].system_message, EXTRACTION_SYSTEM_MESSAGE);
        assert_eq!(sent[0].max_tokens, EXTRACTION_MAX_TOKENS);
        assert!(sent[0].prompt.contains("Jane Doe is a pilot."));
        assert!(sent[0].model_override.is_none());
    }

    #[tokio::test]
    async fn test_gateway_error_propagates_untouched() {
        let gateway = Arc::new(ScriptedGateway::new());
        let err = DomainError::GatewayCallFailed("API error 502 Bad Gateway: upstream".to_string());
        gateway.push_error(err.clone());
        let result = service(gateway.clone())
            .extract(&ExtractionRequest::new("x"))
            .await;
        assert_eq!(result, Err(err));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_gateway() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_error(DomainError::GatewayUnavailable("no key".to_string()));
        assert!(matches!(
            service(gateway).extract(&ExtractionRequest::new("x")).await,
            Err(DomainError::GatewayUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_sentinel_text_short_circuits() {
        let gateway = Arc::new(ScriptedGateway::always(
            "Error: Failed to get response from LLM. Details: timeout",
        ));
        assert!(matches!(
            service(gateway).extract(&ExtractionRequest::new("x")).await,
            Err(DomainError::GatewayCallFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_no_retry_on_malformed_response() {
        let gateway = Arc::new(ScriptedGateway::always("I am not sure who this is."));
        let result = service(gateway.clone())
            .extract(&ExtractionRequest::new("x"))
            .await;
        assert!(matches!(result, Err(DomainError::MalformedResponse { .. })));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_call_failure() {
        let gateway = Arc::new(
            ScriptedGateway::always(r#"{"user_id":"late","name":"Late"}"#)
                .with_delay(Duration::from_millis(200)),
        );
        let service = ExtractionService::new(gateway, Duration::from_millis(20));
        match service.extract(&ExtractionRequest::new("x")).await {
            Err(DomainError::GatewayCallFailed(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_output_same_draft() {
        let raw = r###"{"user_id":"d","name":"D","bio":"b","wiki_content":"## W"}"###;
        let gateway = Arc::new(ScriptedGateway::always(raw));
        let service = service(gateway);
        let req = ExtractionRequest::new("doc");
        let a = service.extract(&req).await.unwrap();
        let b = service.extract(&req).await.unwrap();
        assert_eq!(a, b);
    }
}
