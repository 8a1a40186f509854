use async_trait::async_trait;
use moka::future::Cache;
use routecache_backend::{Backend, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};

use crate::builder::MokaBackendBuilder;

/// In-memory cache pool.
///
/// Cloning is cheap and clones share storage. Data is lost on restart and is
/// not shared between processes.
#[derive(Clone)]
pub struct MokaBackend {
    pub(crate) cache: Cache<CacheKey, CacheValue<Raw>>,
    pub(crate) label: BackendLabel,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    /// Starts a builder.
    pub fn builder() -> MokaBackendBuilder {
        MokaBackendBuilder::new()
    }

    /// The underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheValue<Raw>> {
        &self.cache
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        _ttl: Option<std::time::Duration>,
    ) -> BackendResult<()> {
        self.cache.insert(key.clone(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.cache.remove(key).await {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn prune(&self) -> BackendResult<()> {
        self.cache.run_pending_tasks().await;
        tracing::trace!(label = %self.label, entries = self.cache.entry_count(), "pruned");
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
