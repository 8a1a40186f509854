//! In-memory pools for chain tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use routecache_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};

/// DashMap-backed pool that counts calls.
#[derive(Clone)]
pub struct TestBackend {
    name: &'static str,
    store: Arc<DashMap<CacheKey, CacheValue<Raw>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    prunes: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            store: Arc::new(DashMap::new()),
            reads: Arc::default(),
            writes: Arc::default(),
            prunes: Arc::default(),
        }
    }

    pub fn insert(&self, key: &CacheKey, data: &'static [u8]) {
        self.store
            .insert(key.clone(), CacheValue::new(Raw::from_static(data), None));
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn prunes(&self) -> usize {
        self.prunes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get(key).map(|value| value.clone()))
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        _ttl: Option<Duration>,
    ) -> BackendResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn prune(&self) -> BackendResult<()> {
        self.prunes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static(self.name)
    }
}

/// Pool that fails every operation.
#[derive(Clone, Default)]
pub struct ErrorBackend;

fn simulated() -> BackendError {
    BackendError::InternalError(Box::new(std::io::Error::other("simulated error")))
}

#[async_trait]
impl Backend for ErrorBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        Err(simulated())
    }

    async fn write(
        &self,
        _key: &CacheKey,
        _value: CacheValue<Raw>,
        _ttl: Option<Duration>,
    ) -> BackendResult<()> {
        Err(simulated())
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(simulated())
    }

    async fn prune(&self) -> BackendResult<()> {
        Err(simulated())
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("error")
    }
}
