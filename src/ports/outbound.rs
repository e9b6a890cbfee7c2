//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{CompletionRequest, DomainError, Profile, ProfileDraft, ProfileUpdate};

/// Remote text-generation provider.
///
/// Treated as a black box: it may return prose instead of JSON, truncated JSON when
/// `max_tokens` is too low, or fail outright.
#[async_trait::async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one system message + user prompt pair and return the raw completion text.
    ///
    /// # Errors
    /// `GatewayUnavailable` when no credentials are configured, `GatewayCallFailed`
    /// for network or provider errors.
    async fn send(&self, request: &CompletionRequest) -> Result<String, DomainError>;

    /// Model used when a request carries no override.
    fn default_model(&self) -> &str;
}

/// Keyed profile store. `user_id` is the external key.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a new profile. Fails with `Conflict` when `user_id` already exists.
    async fn create(&self, draft: &ProfileDraft) -> Result<Profile, DomainError>;

    async fn get_by_key(&self, user_id: &str) -> Result<Option<Profile>, DomainError>;

    /// Profiles in insertion order.
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Profile>, DomainError>;

    /// Apply a partial update. Returns `None` when the key is unknown.
    async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, DomainError>;

    /// Insert, or partially update the existing profile with the same `user_id`.
    /// Returns the stored profile and whether it was newly created.
    async fn upsert(&self, draft: &ProfileDraft) -> Result<(Profile, bool), DomainError>;

    /// Returns false when the key is unknown.
    async fn delete(&self, user_id: &str) -> Result<bool, DomainError>;
}
