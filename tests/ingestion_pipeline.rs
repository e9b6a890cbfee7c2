//! End-to-end ingestion: document on disk -> scripted LLM -> SQLite.

use social_os::adapters::llm::ScriptedGateway;
use social_os::adapters::persistence::SqliteProfileStore;
use social_os::domain::{DomainError, ProfileDraft};
use social_os::ports::{LlmGateway, ProfileStore, SilentProgress};
use social_os::usecases::{ExtractionService, IngestionService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    store: Arc<SqliteProfileStore>,
    gateway: Arc<ScriptedGateway>,
    ingestion: IngestionService,
}

async fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(
        SqliteProfileStore::connect(dir.path().join("social.db"))
            .await
            .unwrap(),
    );
    let gateway = Arc::new(ScriptedGateway::new());
    let extraction = Arc::new(ExtractionService::new(
        Arc::clone(&gateway) as Arc<dyn LlmGateway>,
        Duration::from_secs(5),
    ));
    let ingestion = IngestionService::new(
        extraction,
        Arc::clone(&store) as Arc<dyn ProfileStore>,
        Arc::new(SilentProgress),
    );
    Harness {
        dir,
        store,
        gateway,
        ingestion,
    }
}

fn write_doc(h: &Harness, text: &str) -> PathBuf {
    let path = h.dir.path().join("notes.md");
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn test_tagged_fence_response_is_saved() {
    let h = harness().await;
    h.gateway
        .push_response("```json\n{\"user_id\":\"jane_doe\",\"name\":\"Jane Doe\"}\n```");
    let path = write_doc(&h, "Jane Doe is a designer.");

    let outcome = h.ingestion.ingest_file(&path).await.unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.profile.user_id, "jane_doe");
    assert_eq!(outcome.profile.name, "Jane Doe");
    assert_eq!(outcome.profile.bio, None);
    assert_eq!(outcome.profile.wiki_content, None);
    let stored = h.store.get_by_key("jane_doe").await.unwrap().unwrap();
    assert_eq!(stored, outcome.profile);
    // The document text reaches the prompt.
    assert!(h.gateway.requests()[0].prompt.contains("Jane Doe is a designer."));
}

#[tokio::test]
async fn test_prose_around_json_is_malformed() {
    let h = harness().await;
    h.gateway.push_response(
        "Sure! Here is the data: {\"user_id\":\"bob\",\"name\":\"Bob\"} Hope that helps!",
    );
    let path = write_doc(&h, "Bob.");

    let err = h.ingestion.ingest_file(&path).await.unwrap_err();

    assert!(matches!(err, DomainError::MalformedResponse { .. }));
    assert!(h.store.get_by_key("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_user_id_names_field() {
    let h = harness().await;
    h.gateway.push_response("{\"name\":\"No ID Given\"}");
    let path = write_doc(&h, "Someone.");

    let err = h.ingestion.ingest_file(&path).await.unwrap_err();

    match err {
        DomainError::SchemaViolation { field, .. } => assert_eq!(field, "user_id"),
        other => panic!("expected SchemaViolation, got {:?}", other),
    }
    assert!(h.store.list(0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gateway_sentinel_short_circuits() {
    let h = harness().await;
    h.gateway
        .push_response("Error: Failed to get response from LLM. Details: 401");
    let path = write_doc(&h, "Anyone.");

    let err = h.ingestion.ingest_file(&path).await.unwrap_err();

    assert!(matches!(err, DomainError::GatewayCallFailed(_)));
    assert!(h.store.list(0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reingest_updates_in_place() {
    let h = harness().await;
    let first = h.store.upsert(&ProfileDraft::new("x", "A")).await.unwrap();

    h.gateway.push_response("{\"user_id\":\"x\",\"name\":\"B\"}");
    let path = write_doc(&h, "X renamed.");
    let outcome = h.ingestion.ingest_file(&path).await.unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.profile.id, first.0.id);
    assert_eq!(outcome.profile.name, "B");
    let all = h.store.list(0, 10).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "B");
}
