//! Behaviour of the `KeyOrderedStore` extension against the in-memory backend.

use std::sync::Arc;

use kscdb_testing::DeterministicKeyValueStore;
use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;

#[tokio::test]
async fn get_absent_is_none() {
    let store = DeterministicKeyValueStore::new();
    assert_eq!(store.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn cas_insert_only_once() {
    let store = DeterministicKeyValueStore::new();
    assert!(store.cas_insert("k", b"first".to_vec()).await.unwrap());
    assert!(!store.cas_insert("k", b"second".to_vec()).await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), Some(b"first".to_vec()));
}

#[tokio::test]
async fn cas_update_requires_match() {
    let store = DeterministicKeyValueStore::new();
    store.set("k", b"v1".to_vec()).await.unwrap();
    assert!(!store.cas_update("k", b"other", b"v2".to_vec()).await.unwrap());
    assert!(store.cas_update("k", b"v1", b"v2".to_vec()).await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), Some(b"v2".to_vec()));
}

#[tokio::test]
async fn cas_update_on_absent_key_fails() {
    let store = DeterministicKeyValueStore::new();
    assert!(!store.cas_update("k", b"v1", b"v2".to_vec()).await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn cas_delete_requires_match() {
    let store = DeterministicKeyValueStore::new();
    store.set("k", b"v".to_vec()).await.unwrap();
    assert!(!store.cas_delete("k", b"x").await.unwrap());
    assert!(store.cas_delete("k", b"v").await.unwrap());
    assert!(!store.cas_delete("k", b"v").await.unwrap());
}

#[tokio::test]
async fn delete_key_is_idempotent() {
    let store = DeterministicKeyValueStore::new();
    store.set("k", b"v".to_vec()).await.unwrap();
    assert!(store.delete_key("k").await.unwrap());
    assert!(!store.delete_key("k").await.unwrap());
}

#[tokio::test]
async fn range_scan_follows_pages() {
    let store = DeterministicKeyValueStore::new();
    for i in 0..2_500u32 {
        store.set(&format!("p/{i:05}"), i.to_le_bytes().to_vec()).await.unwrap();
    }
    store.set("q/outside", b"x".to_vec()).await.unwrap();

    let entries = store.range_scan("p/").await.unwrap();
    assert_eq!(entries.len(), 2_500);
    assert!(entries.windows(2).all(|w| w[0].key < w[1].key));
    assert!(entries.iter().all(|e| e.key.starts_with("p/")));
}

#[tokio::test]
async fn scan_page_resumes_after_key() {
    let store = DeterministicKeyValueStore::new();
    for key in ["a/1", "a/2", "a/3"] {
        store.set(key, b"v".to_vec()).await.unwrap();
    }
    let page = store.scan_page("a/", 10, Some("a/1")).await.unwrap();
    let keys: Vec<_> = page.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["a/2", "a/3"]);
    assert!(!page.is_truncated);
}

#[tokio::test]
async fn works_through_trait_object() {
    let store: Arc<dyn KeyValueStore> = DeterministicKeyValueStore::new();
    assert!(store.cas_insert("k", b"v".to_vec()).await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
}
