use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};

use crate::{BackendError, DeleteStatus};

/// Result of a cache pool operation.
pub type BackendResult<T> = Result<T, BackendError>;

/// A single cache pool.
///
/// Pools store opaque bytes under a [`CacheKey`]. They handle their own
/// synchronization; the chain calls them from many requests at once.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Reads the entry for `key`. Expired entries are misses.
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>>;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl` is the lifetime requested by the directive; `None` leaves
    /// expiry to the pool's default.
    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()>;

    /// Removes the entry for `key`.
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Purges expired entries ahead of time.
    ///
    /// Pools that expire entries on their own keep the default no-op.
    async fn prune(&self) -> BackendResult<()> {
        Ok(())
    }

    /// Name used in logs and in chain hits.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn prune(&self) -> BackendResult<()> {
        (**self).prune().await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn prune(&self) -> BackendResult<()> {
        (**self).prune().await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}
