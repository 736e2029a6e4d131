//! The JSON-file key-value store behind the fallback storage.

use api_lib::adapters::JsonFileStore;
use std::sync::Arc;
use story_maker_core::{KeyValueStore, KvError, SafeStorage};

#[test]
fn values_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fallback.json");

    let store = JsonFileStore::new(&path);
    assert_eq!(store.get("missing").unwrap(), None);
    store.set("draft", "{\"title\":\"Trip\"}").unwrap();
    store.set("other", "1").unwrap();
    store.remove("other").unwrap();
    store.remove("never-set").unwrap();

    let reopened = JsonFileStore::new(&path);
    assert_eq!(reopened.get("draft").unwrap().as_deref(), Some("{\"title\":\"Trip\"}"));
    assert_eq!(reopened.get("other").unwrap(), None);
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested").join("deeper").join("kv.json"));
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn a_corrupt_file_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.json");
    std::fs::write(&path, "not json").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(matches!(store.get("k"), Err(KvError::Corrupt(_))));
    assert!(matches!(store.set("k", "v"), Err(KvError::Corrupt(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
}

#[test]
fn safe_storage_swallows_store_failures() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.json");
    std::fs::write(&path, "not json").unwrap();

    let storage = SafeStorage::new(Arc::new(JsonFileStore::new(&path)));
    assert_eq!(storage.safe_get::<String>("k"), None);
    storage.safe_set("k", "v");
    storage.safe_remove("k");
}

#[test]
fn probing_a_writable_store_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SafeStorage::new(Arc::new(JsonFileStore::new(dir.path().join("kv.json"))));
    assert!(storage.probe());
    storage.safe_set("draft", &vec![1, 2, 3]);
    assert_eq!(storage.safe_get::<Vec<i32>>("draft"), Some(vec![1, 2, 3]));
}
