//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: application reports to the UI adapter
//! - Outbound: application calls into infrastructure

pub mod inbound;
pub mod outbound;

pub use inbound::{ProgressPort, SilentProgress};
pub use outbound::{LlmGateway, ProfileStore};
