//! HTTP adapter. axum router over the profile and chat use cases.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_server, AppState};
