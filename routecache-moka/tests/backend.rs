use std::time::Duration;

use chrono::Utc;
use routecache_backend::{Backend, DeleteStatus};
use routecache_core::{AllowList, CacheKey, CacheValue, KeyDeriver, Raw};
use routecache_moka::MokaBackend;

fn key(id: u32) -> CacheKey {
    KeyDeriver::derive("moka", &serde_json::json!({ "id": id }), &AllowList::new())
}

#[tokio::test]
async fn test_write_read_remove() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let value = CacheValue::with_ttl(Raw::from_static(b"page"), Some(Duration::from_secs(60)));

    backend.write(&key(1), value.clone(), None).await.unwrap();
    assert_eq!(backend.read(&key(1)).await.unwrap(), Some(value));

    assert_eq!(backend.remove(&key(1)).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(backend.remove(&key(1)).await.unwrap(), DeleteStatus::Missing);
    assert!(backend.read(&key(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_entries_expire() {
    let backend = MokaBackend::builder().build();
    let expire = Utc::now() + chrono::Duration::milliseconds(100);
    backend
        .write(&key(2), CacheValue::new(Raw::from_static(b"short"), Some(expire)), None)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    backend.prune().await.unwrap();

    assert!(backend.read(&key(2)).await.unwrap().is_none());
    assert_eq!(backend.cache().entry_count(), 0);
}

#[tokio::test]
async fn test_saturated_expiry_is_kept() {
    let backend = MokaBackend::builder().build();
    let value = CacheValue::with_ttl(Raw::from_static(b"long"), Some(Duration::MAX));
    backend.write(&key(3), value, None).await.unwrap();
    backend.prune().await.unwrap();

    assert!(backend.read(&key(3)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rewrite_takes_new_expiry() {
    let backend = MokaBackend::builder().build();
    let soon = Utc::now() + chrono::Duration::milliseconds(100);
    let later = Utc::now() + chrono::Duration::seconds(60);
    backend
        .write(&key(3), CacheValue::new(Raw::from_static(b"a"), Some(soon)), None)
        .await
        .unwrap();
    backend
        .write(&key(3), CacheValue::new(Raw::from_static(b"b"), Some(later)), None)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    let value = backend.read(&key(3)).await.unwrap().expect("still stored");
    assert_eq!(value.data(), &Raw::from_static(b"b"));
}

#[test]
fn test_custom_label() {
    let backend = MokaBackend::builder().label("sessions").build();
    assert_eq!(backend.label().as_str(), "sessions");
}
