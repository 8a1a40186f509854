use routecache_core::{AllowList, KeyDeriver};
use routecache_redis::{Error, RedisBackend};

#[test]
fn test_invalid_url_is_rejected() {
    let result = RedisBackend::builder().server("not-a-valid-url").build();
    assert!(matches!(result, Err(Error::Redis(_))));
}

#[test]
fn test_build_does_not_connect() {
    let backend = RedisBackend::builder()
        .server("redis://127.0.0.1:1/")
        .label("sessions")
        .build()
        .unwrap();
    assert!(format!("{backend:?}").contains("connected: false"));
}

#[test]
fn test_storage_key_is_prefixed() {
    let backend = RedisBackend::builder().prefix("app:").build().unwrap();
    let key = KeyDeriver::derive("task_show", &"7".into(), &AllowList::new());
    assert_eq!(backend.storage_key(&key), format!("app:{key}"));
}
