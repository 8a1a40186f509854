pub mod test_backend;

pub use test_backend::{ErrorBackend, TestBackend};

use routecache_core::{AllowList, CacheKey, KeyDeriver};

pub fn key(name: &str) -> CacheKey {
    KeyDeriver::derive("test", &serde_json::json!(name), &AllowList::new())
}
