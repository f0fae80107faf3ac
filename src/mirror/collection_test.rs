use serde_json::{Value, json};

use super::*;
use crate::mirror::test_helpers::MockBackend;
use crate::models::{Tag, TagPatch};

fn tag_json(id: Uuid, name: &str) -> Value {
    json!({ "id": id, "name": name, "color": "#64748b", "createdAt": "2026-01-01T00:00:00Z" })
}

fn setup(rows: Vec<Value>) -> (Arc<MockBackend>, Collection<Tag>) {
    let backend = Arc::new(MockBackend::default());
    backend.seed("tags", rows);
    let collection = Collection::new(Arc::clone(&backend) as Arc<dyn Backend>);
    (backend, collection)
}

// =============================================================================
// load
// =============================================================================

#[tokio::test]
async fn load_replaces_rows() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let (_, tags) = setup(vec![tag_json(a, "vip"), tag_json(b, "late")]);

    assert!(tags.load().await);
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get(b).map(|t| t.name), Some("late".into()));
}

#[tokio::test]
async fn load_failure_keeps_rows() {
    let id = Uuid::new_v4();
    let (backend, tags) = setup(vec![tag_json(id, "vip")]);
    assert!(tags.load().await);

    backend.set_failing(true);
    assert!(!tags.load().await);
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn load_rejects_malformed_rows() {
    let (_, tags) = setup(vec![json!({ "id": "not-a-uuid" })]);
    assert!(!tags.load().await);
    assert!(tags.is_empty());
}

// =============================================================================
// add
// =============================================================================

#[tokio::test]
async fn add_prepends_stored_row() {
    let existing = Uuid::new_v4();
    let (_, tags) = setup(vec![tag_json(existing, "vip")]);
    tags.load().await;

    let new_id = Uuid::new_v4();
    let created = tags.add(&tag_json(new_id, "new")).await.unwrap();
    assert_eq!(created.id, new_id);
    assert_eq!(tags.snapshot()[0].id, new_id);
    assert_eq!(tags.len(), 2);
}

#[tokio::test]
async fn add_failure_returns_none() {
    let (backend, tags) = setup(Vec::new());
    backend.set_failing(true);
    assert!(tags.add(&tag_json(Uuid::new_v4(), "x")).await.is_none());
    assert!(tags.is_empty());
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn update_replaces_with_server_row() {
    let id = Uuid::new_v4();
    let (backend, tags) = setup(vec![tag_json(id, "vip")]);
    tags.load().await;
    *backend.server_fields.lock().unwrap() = Some(json!({ "color": "#ffffff" }));

    let patch = TagPatch { name: Some("gold".into()), ..TagPatch::default() };
    let stored = tags.update(id, &patch).await.unwrap();
    assert_eq!(stored.name, "gold");
    assert_eq!(stored.color, "#ffffff");
    assert_eq!(tags.get(id), Some(stored));
}

#[tokio::test]
async fn update_failure_keeps_optimistic_row() {
    let id = Uuid::new_v4();
    let (backend, tags) = setup(vec![tag_json(id, "vip")]);
    tags.load().await;
    backend.set_failing(true);

    let patch = TagPatch { name: Some("gold".into()), ..TagPatch::default() };
    assert!(tags.update(id, &patch).await.is_none());
    assert_eq!(tags.get(id).map(|t| t.name), Some("gold".into()));
}

#[tokio::test]
async fn update_notifies_subscribers() {
    let id = Uuid::new_v4();
    let (_, tags) = setup(vec![tag_json(id, "vip")]);
    tags.load().await;
    let mut rx = tags.subscribe();
    rx.mark_unchanged();

    let patch = TagPatch { color: Some("#000000".into()), ..TagPatch::default() };
    tags.update(id, &patch).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update()[0].color, "#000000");
}

// =============================================================================
// remove
// =============================================================================

#[tokio::test]
async fn remove_deletes_locally_and_remotely() {
    let id = Uuid::new_v4();
    let (backend, tags) = setup(vec![tag_json(id, "vip")]);
    tags.load().await;

    assert!(tags.remove(id).await);
    assert!(tags.is_empty());
    assert!(backend.calls().contains(&format!("DELETE tags/{id}")));
}

#[tokio::test]
async fn remove_failure_is_not_restored() {
    let id = Uuid::new_v4();
    let (backend, tags) = setup(vec![tag_json(id, "vip")]);
    tags.load().await;
    backend.set_failing(true);

    assert!(!tags.remove(id).await);
    assert!(tags.get(id).is_none());
}

// =============================================================================
// merge_patch
// =============================================================================

#[test]
fn merge_patch_overlays_only_present_keys() {
    let id = Uuid::new_v4();
    let tag: Tag = serde_json::from_value(tag_json(id, "vip")).unwrap();
    let merged = merge_patch(&tag, &json!({ "name": "gold" })).unwrap();
    assert_eq!(merged.name, "gold");
    assert_eq!(merged.color, tag.color);
    assert_eq!(merged.id, id);
}

#[test]
fn replace_local_ignores_unknown_rows() {
    let (_, tags) = setup(Vec::new());
    let tag: Tag = serde_json::from_value(tag_json(Uuid::new_v4(), "vip")).unwrap();
    assert!(!tags.replace_local(tag));
}
