//! Free-form chat use case: forwards one prompt to the gateway.

use crate::domain::entities::{DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_MESSAGE, DEFAULT_TEMPERATURE};
use crate::domain::{CompletionRequest, DomainError};
use crate::ports::LlmGateway;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Chat input. Unset fields fall back to the generic assistant defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub prompt: String,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub model_used: String,
}

pub struct ChatService {
    gateway: Arc<dyn LlmGateway>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(gateway: Arc<dyn LlmGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn complete(&self, input: ChatInput) -> Result<ChatReply, DomainError> {
        if input.prompt.trim().is_empty() {
            return Err(DomainError::Validation("prompt must not be empty".to_string()));
        }
        if let Some(t) = input.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(DomainError::Validation(
                    "temperature must be between 0 and 2".to_string(),
                ));
            }
        }

        let model_used = input
            .model
            .clone()
            .unwrap_or_else(|| self.gateway.default_model().to_string());
        let request = CompletionRequest {
            system_message: input
                .system_message
                .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string()),
            prompt: input.prompt,
            model_override: input.model,
            max_tokens: input.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: input.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };

        let response = tokio::time::timeout(self.timeout, self.gateway.send(&request))
            .await
            .map_err(|_| {
                DomainError::GatewayCallFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        Ok(ChatReply {
            response,
            model_used,
        })
    }
}
