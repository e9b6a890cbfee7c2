//! OpenAI-compatible chat-completions gateway.
//!
//! Defaults to OpenRouter but works with any endpoint speaking the same protocol
//! (OpenAI, Azure OpenAI, local Ollama).

use crate::domain::{CompletionRequest, DomainError};
use crate::ports::LlmGateway;
use crate::shared::config::{GatewayCredentials, GatewaySettings};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Marker that stops the date/time preamble from being added twice.
const DATETIME_MARKER: &str = "Current date and time:";

enum GatewayState {
    Ready {
        client: reqwest::Client,
        api_key: String,
    },
    Unconfigured,
}

/// LLM gateway over HTTP.
///
/// Constructed once at process start from [`GatewaySettings`]. Without credentials the
/// gateway still exists and every call fails with `GatewayUnavailable`.
pub struct OpenRouterGateway {
    state: GatewayState,
    api_url: String,
    default_model: String,
    site_url: String,
    app_name: String,
}

impl OpenRouterGateway {
    pub fn new(settings: GatewaySettings) -> Self {
        let state = match settings.credentials {
            GatewayCredentials::ApiKey(api_key) => GatewayState::Ready {
                client: reqwest::Client::new(),
                api_key,
            },
            GatewayCredentials::Unconfigured => {
                warn!("no LLM API key configured; extraction and chat will be unavailable");
                GatewayState::Unconfigured
            }
        };
        Self {
            state,
            api_url: settings.api_url,
            default_model: settings.default_model,
            site_url: settings.site_url,
            app_name: settings.app_name,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, GatewayState::Ready { .. })
    }

    /// Prefix the system message with the current local date and time, once.
    fn with_datetime(system_message: &str, now: &str) -> String {
        if system_message.contains(DATETIME_MARKER) {
            system_message.to_string()
        } else {
            format!("{} {}\n\n{}", DATETIME_MARKER, now, system_message)
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let now = Local::now().format("%A, %B %d, %Y at %I:%M %p").to_string();
        ChatRequest {
            model: self.model_for(request).to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::with_datetime(&request.system_message, &now),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn model_for<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        request
            .model_override
            .as_deref()
            .unwrap_or(&self.default_model)
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn send(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let (client, api_key) = match &self.state {
            GatewayState::Ready { client, api_key } => (client, api_key),
            GatewayState::Unconfigured => {
                return Err(DomainError::GatewayUnavailable(
                    "no API key configured (set OPENROUTER_API_KEY or SOCIAL_OS_LLM_API_KEY)"
                        .to_string(),
                ));
            }
        };

        let body = self.build_request(request);
        info!(
            model = %body.model,
            prompt_len = request.prompt.len(),
            max_tokens = body.max_tokens,
            temperature = body.temperature,
            "sending completion request"
        );

        let response = client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DomainError::GatewayCallFailed(format!(
                    "HTTP request to model {} failed: {}",
                    body.model, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(200).collect();
            warn!(status = %status, body = %excerpt, "LLM API returned error");
            return Err(DomainError::GatewayCallFailed(format!(
                "API error {}: {}",
                status, excerpt
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            DomainError::GatewayCallFailed(format!("Failed to parse API response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| {
                DomainError::GatewayCallFailed("No response choices returned".to_string())
            })?;

        debug!(raw_len = content.len(), "received completion");
        Ok(content)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
