//! LLM adapter module. Implements LlmGateway.
//!
//! Provides the OpenAI-compatible HTTP gateway and a scripted gateway for testing.

pub mod openrouter;
pub mod scripted;

pub use openrouter::OpenRouterGateway;
pub use scripted::ScriptedGateway;
