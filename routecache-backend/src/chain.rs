//! Ordered chain of cache pools.
//!
//! Reads walk the chain in order and stop at the first hit. Writes, deletes
//! and prunes go to every pool. A value found in a later pool is not copied
//! back into the pools before it.

use std::{sync::Arc, time::Duration};

use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};

use crate::metrics::{self, Timer};
use crate::{Backend, BackendError, BackendResult, ChainError, EmptyChain};

/// A value read from the chain and the pool that had it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHit {
    /// The stored value.
    pub value: CacheValue<Raw>,
    /// Label of the pool that answered.
    pub source: BackendLabel,
}

/// Ordered, non-empty list of cache pools.
///
/// Order is fixed at construction. It is the read priority and the write
/// order.
#[derive(Clone)]
pub struct CachePoolChain {
    pools: Arc<[Arc<dyn Backend>]>,
}

impl std::fmt::Debug for CachePoolChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.pools.iter().map(|pool| pool.label()))
            .finish()
    }
}

impl CachePoolChain {
    /// Builds a chain from `pools`, failing if there are none.
    pub fn new(pools: Vec<Arc<dyn Backend>>) -> Result<Self, EmptyChain> {
        if pools.is_empty() {
            return Err(EmptyChain);
        }
        Ok(CachePoolChain {
            pools: pools.into(),
        })
    }

    /// Builds a chain from optional pools, dropping the absent ones.
    pub fn from_optional<I>(pools: I) -> Result<Self, EmptyChain>
    where
        I: IntoIterator<Item = Option<Arc<dyn Backend>>>,
    {
        Self::new(pools.into_iter().flatten().collect())
    }

    /// Builds a chain and prunes every pool once.
    pub async fn activate(pools: Vec<Arc<dyn Backend>>) -> Result<Self, ChainError> {
        let chain = Self::new(pools)?;
        chain.prune().await?;
        Ok(chain)
    }

    /// Number of pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Always `false`; a chain holds at least one pool.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Labels of the pools in chain order.
    pub fn labels(&self) -> Vec<BackendLabel> {
        self.pools.iter().map(|pool| pool.label()).collect()
    }

    /// Returns the first hit in chain order.
    ///
    /// A failing pool is skipped. When no pool has the key and at least one
    /// failed, the first failure is returned.
    #[tracing::instrument(skip(self), level = "trace")]
    pub async fn get(&self, key: &CacheKey) -> BackendResult<Option<ChainHit>> {
        let mut first_error = None;
        for pool in self.pools.iter() {
            let label = pool.label();
            let timer = Timer::new();
            let result = pool.read(key).await;
            metrics::record_read(label.as_str(), timer.elapsed());
            match result {
                Ok(Some(value)) => {
                    tracing::trace!(backend = %label, "hit");
                    return Ok(Some(ChainHit {
                        value,
                        source: label,
                    }));
                }
                Ok(None) => {
                    tracing::trace!(backend = %label, "miss");
                }
                Err(error) => {
                    tracing::trace!(backend = %label, ?error, "read failed");
                    metrics::record_read_error(label.as_str());
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }

    /// Writes `value` to every pool.
    #[tracing::instrument(skip(self, value), level = "trace")]
    pub async fn set(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        let mut first_error = None;
        for pool in self.pools.iter() {
            let label = pool.label();
            let timer = Timer::new();
            let result = pool.write(key, value.clone(), ttl).await;
            metrics::record_write(label.as_str(), timer.elapsed());
            if let Err(error) = result {
                tracing::error!(backend = %label, ?error, "write failed");
                metrics::record_write_error(label.as_str());
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Removes `key` from every pool.
    ///
    /// Returns `true` if any pool held the key.
    #[tracing::instrument(skip(self), level = "trace")]
    pub async fn delete(&self, key: &CacheKey) -> BackendResult<bool> {
        let mut first_error = None;
        let mut deleted = false;
        for pool in self.pools.iter() {
            match pool.remove(key).await {
                Ok(status) => deleted |= status.is_deleted(),
                Err(error) => {
                    tracing::error!(backend = %pool.label(), ?error, "delete failed");
                    metrics::record_delete_error(pool.label().as_str());
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(deleted), Err)
    }

    /// Lets every pool purge expired entries.
    #[tracing::instrument(skip(self), level = "trace")]
    pub async fn prune(&self) -> BackendResult<()> {
        let mut first_error: Option<BackendError> = None;
        for pool in self.pools.iter() {
            if let Err(error) = pool.prune().await {
                tracing::error!(backend = %pool.label(), ?error, "prune failed");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
