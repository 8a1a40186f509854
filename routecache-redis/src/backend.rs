//! Redis pool implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{Client, aio::ConnectionManager};
use routecache_backend::{Backend, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, MAX_EXPIRY, Raw, ttl_secs};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Default key namespace.
pub const DEFAULT_PREFIX: &str = "routecache:";

/// Cache pool stored in Redis.
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    prefix: String,
    label: BackendLabel,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("label", &self.label)
            .field("prefix", &self.prefix)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisBackend {
    /// Creates a pool for `redis://127.0.0.1/`.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Starts a builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Returns the shared connection, connecting on first use.
    pub async fn connection(&self) -> Result<&ConnectionManager, Error> {
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("initialize redis connection manager");
                self.client.get_connection_manager()
            })
            .await?;
        Ok(manager)
    }

    /// Redis key an entry is stored under.
    pub fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Builder for [`RedisBackend`].
#[derive(Debug, Clone)]
pub struct RedisBackendBuilder {
    connection_info: String,
    prefix: String,
    label: BackendLabel,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            prefix: DEFAULT_PREFIX.to_owned(),
            label: BackendLabel::new_static("redis"),
        }
    }
}

impl RedisBackendBuilder {
    /// Sets the connection URL (host, port, database, credentials).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Sets the namespace prepended to every key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the label used in logs.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Validates the URL and creates the pool. No connection is made yet.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            prefix: self.prefix,
            label: self.label,
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        let mut con = self.connection().await?.clone();
        let storage_key = self.storage_key(key);

        let (data, pttl): (Option<Vec<u8>>, i64) = redis::pipe()
            .cmd("GET")
            .arg(&storage_key)
            .cmd("PTTL")
            .arg(&storage_key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        let Some(data) = data else {
            return Ok(None);
        };
        // PTTL is -1 without expiry and -2 for a missing key
        let expire = (pttl > 0).then(|| {
            Utc::now()
                .checked_add_signed(chrono::Duration::milliseconds(pttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Ok(Some(CacheValue::new(Raw::from(data), expire)))
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();
        let storage_key = self.storage_key(key);

        let mut pipe = redis::pipe();
        pipe.cmd("SET")
            .arg(&storage_key)
            .arg(value.data().as_ref())
            .ignore();
        let expire = ttl
            .or_else(|| value.ttl())
            .map(|ttl| ttl_secs(ttl.min(MAX_EXPIRY)))
            .filter(|secs| *secs > 0);
        if let Some(secs) = expire {
            pipe.cmd("EXPIRE").arg(&storage_key).arg(secs).ignore();
        }
        pipe.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?.clone();

        let deleted: u32 = redis::cmd("DEL")
            .arg(self.storage_key(key))
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        Ok(if deleted > 0 {
            DeleteStatus::Deleted(deleted)
        } else {
            DeleteStatus::Missing
        })
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
