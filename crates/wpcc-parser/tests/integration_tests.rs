//! Integration tests for wpcc-parser with a real two-tier store.
//!
//! These tests drive the transformer the way the HTTP layer does: a REST
//! payload plus the originating request, with the response cache wired in.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wpcc_core::RouteContext;
use wpcc_parser::{
    normalize_token, KeyNormalizer, ResponseTransformer, TransformOutcome, TransformerOptions, ValueClassifier,
};
use wpcc_store::{cache_key, KeyValueStore, MemoryStore, ResponseCache};

const POSTS_REPORT: &str = "/wp/v2/posts/reports";

fn posts_payload() -> Value {
    json!([
        {
            "id": 101,
            "date": "2024-01-15T10:30:00",
            "link": "https://example.com/hello-world",
            "title": { "rendered": "Hello world" },
            "featured_media_url": "https://cdn.example.com/cover.png",
            "tags": [3, 7]
        },
        {
            "id": 102,
            "date": "2024-01-16T08:00:00",
            "link": "https://example.com/second",
            "title": { "rendered": "Second" },
            "featured_media_url": "https://cdn.example.com/second.jpg",
            "tags": []
        }
    ])
}

fn png_probe(url: &str) -> bool {
    url.ends_with(".png")
}

fn setup() -> (Arc<MemoryStore>, ResponseTransformer) {
    let store = Arc::new(MemoryStore::new());
    let cache = ResponseCache::new(store.clone());
    let classifier = ValueClassifier::new(KeyNormalizer::new(), Arc::new(png_probe));
    let transformer = ResponseTransformer::new(classifier, Some(cache), TransformerOptions::default());
    (store, transformer)
}

// =============================================================================
// Flattening
// =============================================================================

#[test]
fn test_posts_flattened() {
    let (_, t) = setup();
    let out = t.transform(&posts_payload(), &RouteContext::new(POSTS_REPORT));

    let rows = out.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], json!(101));
    assert_eq!(rows[0]["date"], json!(1705314600));
    assert_eq!(rows[0]["title_rendered"], json!("Hello world"));
    assert_eq!(rows[0]["tags_0"], json!(3));
    assert_eq!(rows[0]["tags_1"], json!(7));
    assert!(rows[1].get("tags").is_none());
}

#[test]
fn test_round_trip_of_plain_object() {
    let (_, t) = setup();
    let original = json!({ "post title": "Hello", "view-count": 12, "is:sticky": false, "a.b": "c" });
    let out = t.transform(&original, &RouteContext::new("/site/reports"));

    for (key, value) in original.as_object().unwrap() {
        assert_eq!(&out[normalize_token(key)], value, "lookup failed for {}", key);
    }
}

#[test]
fn test_non_report_route_untouched() {
    let (_, t) = setup();
    let payload = posts_payload();
    let ctx = RouteContext::new("/wp/v2/posts").with_param("skeleton", "1");
    assert_eq!(t.transform(&payload, &ctx), payload);
}

// =============================================================================
// Skeletons
// =============================================================================

#[test]
fn test_skeleton_lists_keys_per_row() {
    let (_, t) = setup();
    let ctx = RouteContext::new(POSTS_REPORT).with_param("skeleton", "1");
    let out = t.transform(&posts_payload(), &ctx);

    let keys: Vec<&str> = out.as_array().unwrap().iter().map(|k| k.as_str().unwrap()).collect();
    assert_eq!(&keys[..5], ["id", "date", "link", "title_rendered", "featured_media_url"]);
    assert!(keys.contains(&"tags_0"));
}

#[test]
fn test_described_skeleton_types() {
    let (_, t) = setup();
    let ctx = RouteContext::new(POSTS_REPORT)
        .with_param("skeleton", "1")
        .with_param("skeleton_type", "1");
    let out = t.transform(&posts_payload(), &ctx);

    assert_eq!(out["id"]["type"], json!("NUMBER"));
    assert_eq!(out["date"]["type"], json!("DURATION"));
    assert_eq!(out["link"]["type"], json!("URL"));
    assert_eq!(
        out["link"]["formula"],
        json!("HYPERLINK('https://example.com/second', 'Link Description')")
    );
    assert_eq!(out["title_rendered"]["name"], json!("Title Rendered"));
    assert_eq!(out["featured_media_url"]["type"], json!("URL"));
}

#[test]
fn test_image_detected_through_probe() {
    let (_, t) = setup();
    let ctx = RouteContext::new("/media/reports")
        .with_param("skeleton", "1")
        .with_param("skeleton_type", "1");
    let out = t.transform(&json!({ "cover": "https://x/y.png" }), &ctx);

    assert_eq!(out["cover"]["type"], json!("IMAGE"));
    assert_eq!(out["cover"]["formula"], json!("IMAGE('https://x/y.png', 'Alt Text')"));
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_saved_config_short_circuits_described_skeleton() {
    let (store, t) = setup();
    let saved = json!({ "id": { "name": "Post ID", "type": "NUMBER" } });
    ResponseCache::new(store.clone()).save_config(POSTS_REPORT, saved.clone()).unwrap();

    let ctx = RouteContext::new(POSTS_REPORT)
        .with_param("skeleton", "1")
        .with_param("skeleton_type", "1");
    let (out, outcome) = t.transform_with_outcome(&posts_payload(), &ctx);
    assert_eq!(outcome, TransformOutcome::CacheHit);
    assert_eq!(out, saved);
}

#[test]
fn test_cache_ignored_without_skeleton_type() {
    let (store, t) = setup();
    store.set_durable(&cache_key(POSTS_REPORT), json!({ "cached": true })).unwrap();

    let ctx = RouteContext::new(POSTS_REPORT).with_param("skeleton", "1");
    let (_, outcome) = t.transform_with_outcome(&posts_payload(), &ctx);
    assert_eq!(outcome, TransformOutcome::Computed);
}

#[test]
fn test_described_skeleton_remembered_ephemerally() {
    let (store, t) = setup();
    let ctx = RouteContext::new(POSTS_REPORT)
        .with_param("skeleton", "1")
        .with_param("skeleton_type", "1");

    let (first, outcome) = t.transform_with_outcome(&posts_payload(), &ctx);
    assert_eq!(outcome, TransformOutcome::Computed);

    let key = cache_key(POSTS_REPORT);
    assert_eq!(store.get_durable(&key).unwrap(), None);
    assert_eq!(store.get_ephemeral(&key).unwrap(), Some(first.clone()));

    let (second, outcome) = t.transform_with_outcome(&posts_payload(), &ctx);
    assert_eq!(outcome, TransformOutcome::CacheHit);
    assert_eq!(second, first);
}

#[test]
fn test_ephemeral_entry_overrides_saved_fields() {
    let (store, t) = setup();
    let key = cache_key(POSTS_REPORT);
    store.set_durable(&key, json!({ "a": "saved", "b": "saved" })).unwrap();
    store
        .set_ephemeral_with_ttl(&key, json!({ "a": "fresh" }), Duration::from_secs(60))
        .unwrap();

    let ctx = RouteContext::new(POSTS_REPORT).with_param("skeleton_type", "1");
    let out = t.transform(&posts_payload(), &ctx);
    assert_eq!(out, json!({ "a": "fresh", "b": "saved" }));
}

// =============================================================================
// Display-name hook
// =============================================================================

#[test]
fn test_display_name_hook_overrides_names() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let names = KeyNormalizer::with_hook(Arc::new(
        move |route: &str, key: &str, default: String, _original: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            if route == "_wp_v2_posts_reports" && key == "id" {
                "Post ID".to_string()
            } else {
                default
            }
        },
    ));
    let t = ResponseTransformer::new(
        ValueClassifier::new(names, Arc::new(png_probe)),
        None,
        TransformerOptions::default(),
    );

    let ctx = RouteContext::new(POSTS_REPORT)
        .with_param("skeleton", "1")
        .with_param("skeleton_type", "1");
    let out = t.transform(&json!({ "id": 1, "slug": "s" }), &ctx);

    assert_eq!(out["id"]["name"], json!("Post ID"));
    assert_eq!(out["slug"]["name"], json!("Slug"));
    assert!(calls.load(Ordering::SeqCst) >= 2);
}
