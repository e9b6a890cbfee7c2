//! SQLite-backed profile store via libsql. Implements ProfileStore.
//!
//! Single `users` table keyed by an autoincrement `id` with a UNIQUE `user_id`.
//! Timestamps are RFC 3339 text in UTC. Upsert is one `INSERT .. ON CONFLICT` statement,
//! so concurrent ingests of the same key resolve last-write-wins.

use crate::domain::{DomainError, Profile, ProfileDraft, ProfileUpdate};
use crate::ports::ProfileStore;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Connection, Database, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    bio TEXT,
    wiki_content TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

/// How long a connection waits on another writer before failing with `database is locked`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_USER: &str = "SELECT id, user_id, name, bio, wiki_content, created_at, updated_at FROM users WHERE user_id = ?1";

const LIST_USERS: &str = "SELECT id, user_id, name, bio, wiki_content, created_at, updated_at FROM users ORDER BY id LIMIT ?1 OFFSET ?2";

const INSERT_USER: &str = r#"
INSERT INTO users (user_id, name, bio, wiki_content, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?5)
"#;

/// Optional fields are only overwritten when the draft carries them.
const UPSERT_USER: &str = r#"
INSERT INTO users (user_id, name, bio, wiki_content, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?5)
ON CONFLICT (user_id) DO UPDATE SET
    name = excluded.name,
    bio = COALESCE(excluded.bio, users.bio),
    wiki_content = COALESCE(excluded.wiki_content, users.wiki_content),
    updated_at = excluded.updated_at
"#;

const UPDATE_USER: &str = r#"
UPDATE users SET
    name = COALESCE(?2, name),
    bio = CASE WHEN ?3 THEN ?4 ELSE bio END,
    wiki_content = CASE WHEN ?5 THEN ?6 ELSE wiki_content END,
    updated_at = ?7
WHERE user_id = ?1
"#;

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// Current time in the stored text format.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_stamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Repo(format!("bad timestamp '{}': {}", s, e)))
}

/// SQLite profile store. Safe to share via Arc; each call opens its own connection.
pub struct SqliteProfileStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteProfileStore {
    /// Open (or create) the database file and ensure the schema exists.
    /// Sets WAL mode so the API can read while an ingest writes.
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(repo_err)?;
        }
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(repo_err)?;

        // PRAGMA returns a row; query and drain instead of execute.
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(repo_err)?.is_some() {}

        conn.execute(USERS_TABLE, ()).await.map_err(repo_err)?;

        info!(path = %db_path.display(), "profile store ready");

        Ok(Self {
            db,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(repo_err)?;
        Ok(conn)
    }

    /// Write transaction. Takes the write lock up front so a read inside it cannot
    /// deadlock against another writer.
    async fn write_tx(conn: &Connection) -> Result<Transaction, DomainError> {
        conn.transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)
    }

    async fn fetch(conn: &Connection, user_id: &str) -> Result<Option<Profile>, DomainError> {
        let mut rows = conn
            .query(SELECT_USER, params![user_id])
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_profile(row: &libsql::Row) -> Result<Profile, DomainError> {
        let id: i64 = row.get(0).map_err(repo_err)?;
        let user_id: String = row.get(1).map_err(repo_err)?;
        let name: String = row.get(2).map_err(repo_err)?;
        let bio: Option<String> = row.get(3).map_err(repo_err)?;
        let wiki_content: Option<String> = row.get(4).map_err(repo_err)?;
        let created_at: String = row.get(5).map_err(repo_err)?;
        let updated_at: String = row.get(6).map_err(repo_err)?;
        Ok(Profile {
            id,
            user_id,
            name,
            bio,
            wiki_content,
            created_at: parse_stamp(&created_at)?,
            updated_at: parse_stamp(&updated_at)?,
        })
    }

    fn vanished(user_id: &str) -> DomainError {
        DomainError::Repo(format!("user '{}' vanished mid-transaction", user_id))
    }
}

#[async_trait::async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn create(&self, draft: &ProfileDraft) -> Result<Profile, DomainError> {
        let conn = self.conn()?;
        let tx = Self::write_tx(&conn).await?;
        if Self::fetch(&tx, &draft.user_id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "User with user_id '{}' already exists",
                draft.user_id
            )));
        }
        tx.execute(
            INSERT_USER,
            params![
                draft.user_id.as_str(),
                draft.name.as_str(),
                draft.bio.as_deref(),
                draft.wiki_content.as_deref(),
                now_stamp()
            ],
        )
        .await
        .map_err(repo_err)?;
        let profile = Self::fetch(&tx, &draft.user_id)
            .await?
            .ok_or_else(|| Self::vanished(&draft.user_id))?;
        tx.commit().await.map_err(repo_err)?;
        debug!(user_id = %profile.user_id, id = profile.id, "profile created");
        Ok(profile)
    }

    async fn get_by_key(&self, user_id: &str) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn()?;
        Self::fetch(&conn, user_id).await
    }

    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Profile>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(LIST_USERS, params![limit as i64, offset as i64])
            .await
            .map_err(repo_err)?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            profiles.push(Self::row_to_profile(&row)?);
        }
        Ok(profiles)
    }

    async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn()?;
        let tx = Self::write_tx(&conn).await?;
        let changed = tx
            .execute(
                UPDATE_USER,
                params![
                    user_id,
                    update.name.as_deref(),
                    update.bio.is_some() as i64,
                    update.bio.clone().flatten(),
                    update.wiki_content.is_some() as i64,
                    update.wiki_content.clone().flatten(),
                    now_stamp()
                ],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Ok(None);
        }
        let profile = Self::fetch(&tx, user_id).await?;
        tx.commit().await.map_err(repo_err)?;
        Ok(profile)
    }

    async fn upsert(&self, draft: &ProfileDraft) -> Result<(Profile, bool), DomainError> {
        let conn = self.conn()?;
        let tx = Self::write_tx(&conn).await?;
        let existed = Self::fetch(&tx, &draft.user_id).await?.is_some();
        tx.execute(
            UPSERT_USER,
            params![
                draft.user_id.as_str(),
                draft.name.as_str(),
                draft.bio.as_deref(),
                draft.wiki_content.as_deref(),
                now_stamp()
            ],
        )
        .await
        .map_err(repo_err)?;
        let profile = Self::fetch(&tx, &draft.user_id)
            .await?
            .ok_or_else(|| Self::vanished(&draft.user_id))?;
        tx.commit().await.map_err(repo_err)?;
        info!(
            user_id = %profile.user_id,
            id = profile.id,
            created = !existed,
            "profile upserted"
        );
        Ok((profile, !existed))
    }

    async fn delete(&self, user_id: &str) -> Result<bool, DomainError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM users WHERE user_id = ?1", params![user_id])
            .await
            .map_err(repo_err)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, SqliteProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteProfileStore::connect(dir.path().join("profiles.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn draft(user_id: &str, name: &str, bio: Option<&str>, wiki: Option<&str>) -> ProfileDraft {
        ProfileDraft {
            user_id: user_id.to_string(),
            name: name.to_string(),
            bio: bio.map(str::to_string),
            wiki_content: wiki.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = store().await;
        let created = store
            .create(&draft("john_doe", "John Doe", Some("Engineer"), Some("## Bio")))
            .await
            .unwrap();
        assert_eq!(created.user_id, "john_doe");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get_by_key("john_doe").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_by_key("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let (_dir, store) = store().await;
        store.create(&draft("x", "A", None, None)).await.unwrap();
        let err = store.create(&draft("x", "B", None, None)).await.unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert!(msg.contains("already exists")),
            other => panic!("expected Conflict, got {:?}", other),
        }
        assert_eq!(store.get_by_key("x").await.unwrap().unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let (_dir, store) = store().await;
        let (first, created) = store.upsert(&draft("x", "A", None, None)).await.unwrap();
        assert!(created);
        assert_eq!(first.created_at, first.updated_at);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let (second, created) = store.upsert(&draft("x", "B", None, None)).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "B");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(store.list(0, 100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_absent_optional_fields() {
        let (_dir, store) = store().await;
        store
            .upsert(&draft("x", "A", Some("tagline"), Some("## Wiki")))
            .await
            .unwrap();
        let (after, _) = store
            .upsert(&draft("x", "A2", None, Some("## New")))
            .await
            .unwrap();
        assert_eq!(after.bio.as_deref(), Some("tagline"));
        assert_eq!(after.wiki_content.as_deref(), Some("## New"));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (_dir, store) = store().await;
        store
            .create(&draft("john_doe", "John Doe", Some("Engineer"), Some("Original")))
            .await
            .unwrap();
        let update = ProfileUpdate {
            bio: Some(Some("Senior Engineer".to_string())),
            ..Default::default()
        };
        let updated = store.update("john_doe", &update).await.unwrap().unwrap();
        assert_eq!(updated.name, "John Doe");
        assert_eq!(updated.bio.as_deref(), Some("Senior Engineer"));
        assert_eq!(updated.wiki_content.as_deref(), Some("Original"));

        assert!(store.update("nobody", &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pagination_in_insertion_order() {
        let (_dir, store) = store().await;
        for i in 0..5 {
            store
                .create(&draft(&format!("user{}", i), &format!("User {}", i), None, None))
                .await
                .unwrap();
        }
        let page = store.list(2, 2).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["user2", "user3"]);
        assert_eq!(store.list(4, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = store().await;
        store.create(&draft("gone", "Gone", None, None)).await.unwrap();
        assert!(store.delete("gone").await.unwrap());
        assert!(!store.delete("gone").await.unwrap());
        assert!(store.get_by_key("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profiles.db");
        {
            let store = SqliteProfileStore::connect(&path).await.unwrap();
            store.create(&draft("kept", "Kept", None, None)).await.unwrap();
        }
        let store = SqliteProfileStore::connect(&path).await.unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.get_by_key("kept").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_with_null_clears_field() {
        let (_dir, store) = store().await;
        store
            .create(&draft("jane", "Jane", Some("Bio"), Some("Wiki")))
            .await
            .unwrap();

        let update = ProfileUpdate {
            bio: Some(None),
            ..Default::default()
        };
        let updated = store.update("jane", &update).await.unwrap().unwrap();
        assert_eq!(updated.bio, None);
        assert_eq!(updated.wiki_content.as_deref(), Some("Wiki"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_upserts_same_key() {
        let (_dir, store) = store().await;
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    store.upsert(&ProfileDraft::new("x", format!("N{}", i))).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        let mut created = 0;
        for handle in handles {
            let (profile, was_created) = handle.await.unwrap().unwrap();
            ids.push(profile.id);
            if was_created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        let all = store.list(0, 100).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].name.starts_with('N'));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_creates_distinct_keys() {
        let (_dir, store) = store().await;
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create(&ProfileDraft::new(format!("user{}", i), "Name"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list(0, 100).await.unwrap().len(), 32);
    }
}
