//! Infrastructure adapters. Implement outbound ports.
//!
//! HTTP API, LLM provider, SQLite, console. Map errors to DomainError.

pub mod http;
pub mod llm;
pub mod persistence;
pub mod ui;
