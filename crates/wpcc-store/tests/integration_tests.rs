//! Integration tests for the response cache over a file-backed store.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wpcc_store::{cache_key, FileStore, KeyValueStore, ResponseCache};

const ROUTE: &str = "/wp/v2/posts/reports";

#[test]
fn test_saved_config_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpcc").join("store.json");
    let saved = json!({ "id": { "name": "Post ID", "type": "NUMBER" } });

    {
        let cache = ResponseCache::new(Arc::new(FileStore::open(&path).unwrap()));
        let echo = cache.save_config(ROUTE, saved.clone()).unwrap();
        assert_eq!(echo.key, cache_key(ROUTE));
        cache.remember("/other/reports", json!({ "tmp": 1 })).unwrap();
    }

    let reopened = Arc::new(FileStore::open(&path).unwrap());
    let cache = ResponseCache::new(reopened.clone());
    assert_eq!(cache.read(ROUTE), Some(saved));
    assert_eq!(cache.read("/other/reports"), None);
    assert_eq!(reopened.get_ephemeral(&cache_key(ROUTE)).unwrap(), None);
}

#[test]
fn test_short_ttl_falls_back_to_saved_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("store.json")).unwrap());
    let cache = ResponseCache::with_ttl(store.clone(), Duration::from_millis(20));

    cache.save_config(ROUTE, json!({ "a": "saved" })).unwrap();
    store
        .set_ephemeral_with_ttl(&cache_key(ROUTE), json!({ "a": "fresh", "b": 1 }), Duration::from_millis(20))
        .unwrap();
    assert_eq!(cache.read(ROUTE), Some(json!({ "a": "fresh", "b": 1 })));

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.read(ROUTE), Some(json!({ "a": "saved" })));
}

#[test]
fn test_durable_file_is_a_plain_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let cache = ResponseCache::new(Arc::new(FileStore::open(&path).unwrap()));
    cache.save_config(ROUTE, json!({ "x": 1 })).unwrap();

    let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({ cache_key(ROUTE): { "x": 1 } }));
}
