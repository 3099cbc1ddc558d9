use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use canvas::engine::EngineCore;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn temp_store() -> TemplateStore {
    let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("cardsmith-store-{}-{n}-{}", std::process::id(), now_ms()));
    TemplateStore::new(dir)
}

fn document_with_texts(count: usize) -> Document {
    let mut core = EngineCore::new();
    for _ in 0..count {
        core.add_text();
    }
    core.serialize()
}

// =============================================================================
// Templates
// =============================================================================

#[tokio::test]
async fn template_round_trip() {
    let store = temp_store();
    let document = document_with_texts(2);
    let record = store.save_template("Hero Card", &document).await.unwrap();
    assert_eq!(record.name, "Hero Card");
    assert!(record.saved_at > 0);
    assert!(store.root().join("templates/Hero_Card.json").exists());

    let loaded = store.load_template("Hero Card").await.unwrap();
    assert_eq!(loaded.components.len(), 2);
    assert_eq!(loaded.next_id, Some(3));
}

#[tokio::test]
async fn saved_record_uses_camel_case_fields() {
    let store = temp_store();
    store.save_template("x", &document_with_texts(1)).await.unwrap();
    let text = tokio::fs::read_to_string(store.root().join("templates/x.json")).await.unwrap();
    assert!(text.contains("\"savedAt\""));
    assert!(text.contains("\"widthInches\""));
}

#[tokio::test]
async fn missing_template_is_not_found() {
    let store = temp_store();
    let err = store.load_template("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(name) if name == "nope"));
    assert!(matches!(store.delete_template("nope").await.unwrap_err(), StoreError::NotFound(_)));
}

#[tokio::test]
async fn list_is_newest_first_and_skips_garbage() {
    let store = temp_store();
    assert!(store.list_templates().await.unwrap().is_empty());

    store.save_template("first", &document_with_texts(0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.save_template("second", &document_with_texts(1)).await.unwrap();
    tokio::fs::write(store.root().join("templates/broken.json"), "{").await.unwrap();

    let names: Vec<String> = store.list_templates().await.unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["second".to_string(), "first".to_string()]);
}

#[tokio::test]
async fn delete_removes_template() {
    let store = temp_store();
    store.save_template("gone", &document_with_texts(1)).await.unwrap();
    store.delete_template("gone").await.unwrap();
    assert!(store.list_templates().await.unwrap().is_empty());
}

#[tokio::test]
async fn template_with_duplicate_ids_is_rejected() {
    let store = temp_store();
    let mut document = document_with_texts(1);
    document.components.push(document.components[0].clone());
    store.save_template("dup", &document).await.unwrap();
    assert!(matches!(store.load_template("dup").await.unwrap_err(), StoreError::Document(_)));
}

// =============================================================================
// Autosave slot
// =============================================================================

#[tokio::test]
async fn autosave_slot_round_trip() {
    let store = temp_store();
    assert!(store.load_autosave().await.is_none());
    store.write_autosave(&document_with_texts(3)).await.unwrap();
    assert_eq!(store.load_autosave().await.unwrap().components.len(), 3);
}

#[tokio::test]
async fn malformed_autosave_is_ignored() {
    let store = temp_store();
    tokio::fs::create_dir_all(store.root()).await.unwrap();
    tokio::fs::write(store.root().join("autosave.json"), r#"{"name": "x"}"#).await.unwrap();
    assert!(store.load_autosave().await.is_none());
}

// =============================================================================
// Autosave worker
// =============================================================================

#[tokio::test]
async fn worker_writes_only_the_latest_document_after_quiet_period() {
    let store = temp_store();
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_millis(30));
    autosave.schedule(document_with_texts(1));
    autosave.schedule(document_with_texts(2));
    autosave.schedule(document_with_texts(3));
    assert!(store.load_autosave().await.is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.load_autosave().await.unwrap().components.len(), 3);
    autosave.finish().await;
}

#[tokio::test]
async fn finish_flushes_pending_document() {
    let store = temp_store();
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_secs(60));
    autosave.schedule(document_with_texts(2));
    autosave.finish().await;
    assert_eq!(store.load_autosave().await.unwrap().components.len(), 2);
}

#[tokio::test]
async fn finish_without_requests_writes_nothing() {
    let store = temp_store();
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_millis(10));
    autosave.finish().await;
    assert!(store.load_autosave().await.is_none());
}

#[tokio::test]
async fn schedule_never_waits_on_a_busy_worker() {
    let store = temp_store();
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_millis(20));
    let mut core = EngineCore::new();
    for _ in 0..500 {
        core.add_text();
        autosave.schedule(core.serialize());
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    for _ in 0..500 {
        core.add_text();
        autosave.schedule(core.serialize());
    }
    autosave.finish().await;
    assert_eq!(store.load_autosave().await.unwrap().components.len(), 1000);
}

#[tokio::test]
async fn schedule_after_worker_stopped_is_dropped() {
    let store = temp_store();
    let autosave = spawn_autosave_worker(store.clone(), Duration::from_millis(10));
    autosave.task.abort();
    tokio::time::sleep(Duration::from_millis(10)).await;
    autosave.schedule(document_with_texts(1));
    autosave.finish().await;
    assert!(store.load_autosave().await.is_none());
}
