use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use routecache_backend::{Backend, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw, ttl_secs};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::Error;

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "routecache_items";

/// Cache pool stored in a SQLite table.
#[derive(Debug, Clone)]
pub struct SqlBackend {
    pool: SqlitePool,
    table: String,
    label: BackendLabel,
}

impl SqlBackend {
    /// Starts a builder.
    pub fn builder() -> SqlBackendBuilder {
        SqlBackendBuilder::default()
    }

    /// Wraps an existing connection pool, provisioning `table`.
    pub async fn from_pool(pool: SqlitePool, table: &str) -> Result<Self, Error> {
        validate_table(table)?;
        let backend = SqlBackend {
            pool,
            table: table.to_owned(),
            label: BackendLabel::new_static("sql"),
        };
        backend.provision().await?;
        Ok(backend)
    }

    /// The connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The cache table.
    pub fn table(&self) -> &str {
        &self.table
    }

    async fn provision(&self) -> Result<(), Error> {
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                item_id TEXT PRIMARY KEY NOT NULL, \
                item_data BLOB NOT NULL, \
                item_lifetime INTEGER NULL, \
                item_time INTEGER NOT NULL)",
            self.table
        );
        sqlx::query(&create).execute(&self.pool).await?;

        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(&self.table)
                .fetch_optional(&self.pool)
                .await?;
        if found.is_none() {
            return Err(Error::TableMissing(self.table.clone()));
        }
        tracing::debug!(table = %self.table, "cache table ready");
        Ok(())
    }
}

fn validate_table(table: &str) -> Result<(), Error> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidTableName(table.to_owned()))
    }
}

fn lifetime_secs(ttl: Option<Duration>) -> Option<i64> {
    ttl.map(ttl_secs)
        .filter(|secs| *secs > 0)
        .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Builder for [`SqlBackend`].
#[derive(Debug, Clone)]
pub struct SqlBackendBuilder {
    url: String,
    table: String,
    max_connections: u32,
    label: BackendLabel,
}

impl Default for SqlBackendBuilder {
    fn default() -> Self {
        SqlBackendBuilder {
            url: "sqlite://routecache.db".to_owned(),
            table: DEFAULT_TABLE.to_owned(),
            max_connections: 5,
            label: BackendLabel::new_static("sql"),
        }
    }
}

impl SqlBackendBuilder {
    /// Sets the database URL. The file is created if missing.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the cache table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the connection pool size.
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the label used in logs.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Connects and provisions the table.
    pub async fn build(self) -> Result<SqlBackend, Error> {
        validate_table(&self.table)?;
        let options = SqliteConnectOptions::from_str(&self.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await?;
        let backend = SqlBackend {
            pool,
            table: self.table,
            label: self.label,
        };
        backend.provision().await?;
        Ok(backend)
    }
}

#[async_trait]
impl Backend for SqlBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        let select = format!(
            "SELECT item_data, item_lifetime, item_time FROM {} WHERE item_id = ?",
            self.table
        );
        let row: Option<(Vec<u8>, Option<i64>, i64)> = sqlx::query_as(&select)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::from)?;

        let Some((data, lifetime, written)) = row else {
            return Ok(None);
        };
        // a lifetime past the representable range never expires
        let expire = lifetime
            .and_then(|lifetime| written.checked_add(lifetime))
            .and_then(|expire| DateTime::<Utc>::from_timestamp(expire, 0));
        let value = CacheValue::new(Raw::from(data), expire);
        if value.is_expired() {
            tracing::trace!(%key, "expired row");
            return Ok(None);
        }
        Ok(Some(value))
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        let upsert = format!(
            "INSERT INTO {} (item_id, item_data, item_lifetime, item_time) VALUES (?, ?, ?, ?) \
             ON CONFLICT(item_id) DO UPDATE SET \
             item_data = excluded.item_data, \
             item_lifetime = excluded.item_lifetime, \
             item_time = excluded.item_time",
            self.table
        );
        sqlx::query(&upsert)
            .bind(key.as_str())
            .bind(value.data().as_ref())
            .bind(lifetime_secs(ttl.or_else(|| value.ttl())))
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let delete = format!("DELETE FROM {} WHERE item_id = ?", self.table);
        let result = sqlx::query(&delete)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(match result.rows_affected() {
            0 => DeleteStatus::Missing,
            count => DeleteStatus::Deleted(u32::try_from(count).unwrap_or(u32::MAX)),
        })
    }

    async fn prune(&self) -> BackendResult<()> {
        let prune = format!(
            "DELETE FROM {} WHERE item_lifetime IS NOT NULL AND item_time + item_lifetime <= ?",
            self.table
        );
        let result = sqlx::query(&prune)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        tracing::debug!(table = %self.table, removed = result.rows_affected(), "pruned expired rows");
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
