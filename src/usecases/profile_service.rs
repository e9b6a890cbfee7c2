//! Profile CRUD use case behind the REST API, plus sample-data seeding.

use crate::domain::{DomainError, Profile, ProfileDraft, ProfileSummary, ProfileUpdate};
use crate::ports::ProfileStore;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Sample profiles used by `seed`. Bypasses the LLM.
const SAMPLE_PROFILES: &str = include_str!("../../data/sample_profiles.json");

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Create a profile. Fails with `Conflict` if the key is taken.
    pub async fn create(&self, draft: &ProfileDraft) -> Result<Profile, DomainError> {
        validate_key(&draft.user_id)?;
        validate_name(&draft.name)?;
        self.store.create(draft).await
    }

    pub async fn get(&self, user_id: &str) -> Result<Profile, DomainError> {
        self.store
            .get_by_key(user_id)
            .await?
            .ok_or_else(|| not_found(user_id))
    }

    /// Summaries, `skip` rows in. `limit` is capped at `MAX_PAGE_LIMIT`.
    pub async fn list(&self, skip: u32, limit: u32) -> Result<Vec<ProfileSummary>, DomainError> {
        let limit = limit.min(MAX_PAGE_LIMIT);
        let profiles = self.store.list(skip, limit).await?;
        Ok(profiles.into_iter().map(ProfileSummary::from).collect())
    }

    pub async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, DomainError> {
        if update.is_empty() {
            return Err(DomainError::Validation(
                "update must set at least one of name, bio, wiki_content".to_string(),
            ));
        }
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        self.store
            .update(user_id, update)
            .await?
            .ok_or_else(|| not_found(user_id))
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), DomainError> {
        if self.store.delete(user_id).await? {
            info!(user_id, "profile deleted");
            Ok(())
        } else {
            Err(not_found(user_id))
        }
    }

    /// Upsert the bundled sample profiles. Returns each stored profile and whether it was new.
    pub async fn seed_samples(&self) -> Result<Vec<(Profile, bool)>, DomainError> {
        let drafts: Vec<ProfileDraft> = serde_json::from_str(SAMPLE_PROFILES)
            .map_err(|e| DomainError::Validation(format!("bad sample data: {}", e)))?;
        let mut seeded = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            seeded.push(self.store.upsert(draft).await?);
        }
        info!(count = seeded.len(), "sample profiles seeded");
        Ok(seeded)
    }
}

fn not_found(user_id: &str) -> DomainError {
    DomainError::NotFound(format!("User with user_id '{}' not found", user_id))
}

fn validate_key(user_id: &str) -> Result<(), DomainError> {
    if user_id.trim().is_empty() {
        return Err(DomainError::Validation("user_id must not be empty".to_string()));
    }
    if user_id.contains('/') {
        return Err(DomainError::Validation(
            "user_id must not contain '/'".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::SqliteProfileStore;

    async fn service() -> (tempfile::TempDir, ProfileService) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteProfileStore::connect(dir.path().join("p.db"))
            .await
            .unwrap();
        (dir, ProfileService::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, svc) = service().await;
        match svc.get("ghost").await {
            Err(DomainError::NotFound(msg)) => assert!(msg.contains("not found")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            svc.delete("ghost").await,
            Err(DomainError::NotFound(_))
        ));
        let rename = ProfileUpdate {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update("ghost", &rename).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let (_dir, svc) = service().await;
        svc.create(&ProfileDraft::new("jane", "Jane")).await.unwrap();
        assert!(matches!(
            svc.update("jane", &ProfileUpdate::default()).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (_dir, svc) = service().await;
        assert!(matches!(
            svc.create(&ProfileDraft::new("  ", "Name")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.create(&ProfileDraft::new("a/b", "Name")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.create(&ProfileDraft::new("ok", "")).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_summaries() {
        let (_dir, svc) = service().await;
        svc.create(&ProfileDraft::new("user1", "User One")).await.unwrap();
        svc.create(&ProfileDraft::new("user2", "User Two")).await.unwrap();
        let all = svc.list(0, DEFAULT_PAGE_LIMIT).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user_id, "user1");
        assert!(svc.list(0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (_dir, svc) = service().await;
        let first = svc.seed_samples().await.unwrap();
        assert!(first.len() >= 3);
        assert!(first.iter().all(|(_, created)| *created));

        let second = svc.seed_samples().await.unwrap();
        assert!(second.iter().all(|(_, created)| !*created));
        assert_eq!(svc.list(0, 100).await.unwrap().len(), first.len());
        assert_eq!(svc.get("bob_chen").await.unwrap().name, "Robert Chen");
    }
}
