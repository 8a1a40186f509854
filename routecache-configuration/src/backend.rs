//! Pool definitions.
//!
//! Each entry of `backends` is tagged with its `type`. Entries of type
//! `None`, and `null` entries, stand for a pool that is switched off and are
//! dropped before the chain is built.

use std::sync::Arc;

use routecache::ConfigurationError;
use routecache_backend::Backend as BackendTrait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    #[serde(default = "Moka::default_capacity")]
    pub max_capacity: u64,
}

impl Moka {
    fn default_capacity() -> u64 {
        10_000
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Redis {
    pub connection_string: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Sql {
    pub url: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct File {
    pub directory: String,
}

/// One pool of the chain.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    Moka(Moka),
    Redis(Redis),
    Sql(Sql),
    File(File),
    None,
}

impl Backend {
    /// Name of the pool kind, as written in the document.
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Moka(_) => "Moka",
            Backend::Redis(_) => "Redis",
            Backend::Sql(_) => "Sql",
            Backend::File(_) => "File",
            Backend::None => "None",
        }
    }

    /// Builds the pool. `None` entries yield no pool.
    pub async fn into_backend(self) -> Result<Option<Arc<dyn BackendTrait>>, ConfigurationError> {
        match self {
            #[cfg(feature = "moka")]
            Backend::Moka(config) => {
                use routecache_moka::MokaBackend;

                let backend: Arc<dyn BackendTrait> = Arc::new(
                    MokaBackend::builder()
                        .max_entries(config.max_capacity)
                        .build(),
                );
                Ok(Some(backend))
            }
            #[cfg(not(feature = "moka"))]
            Backend::Moka(_) => Err(ConfigurationError::UnsupportedBackend("Moka".to_string())),
            #[cfg(feature = "redis")]
            Backend::Redis(config) => {
                use routecache_redis::RedisBackend;

                let mut builder = RedisBackend::builder().server(config.connection_string);
                if let Some(prefix) = config.prefix {
                    builder = builder.prefix(prefix);
                }
                let backend = builder.build().map_err(|e| ConfigurationError::Provisioning {
                    backend: "Redis".to_string(),
                    reason: e.to_string(),
                })?;
                let backend: Arc<dyn BackendTrait> = Arc::new(backend);
                Ok(Some(backend))
            }
            #[cfg(not(feature = "redis"))]
            Backend::Redis(_) => Err(ConfigurationError::UnsupportedBackend("Redis".to_string())),
            #[cfg(feature = "sql")]
            Backend::Sql(config) => {
                use routecache_sql::SqlBackend;

                let mut builder = SqlBackend::builder().url(config.url);
                if let Some(table) = config.table {
                    builder = builder.table(table);
                }
                if let Some(max_connections) = config.max_connections {
                    builder = builder.max_connections(max_connections);
                }
                let backend = builder
                    .build()
                    .await
                    .map_err(|e| ConfigurationError::Provisioning {
                        backend: "Sql".to_string(),
                        reason: e.to_string(),
                    })?;
                let backend: Arc<dyn BackendTrait> = Arc::new(backend);
                Ok(Some(backend))
            }
            #[cfg(not(feature = "sql"))]
            Backend::Sql(_) => Err(ConfigurationError::UnsupportedBackend("Sql".to_string())),
            #[cfg(feature = "fs")]
            Backend::File(config) => {
                use routecache_fs::FileBackend;

                let backend = FileBackend::builder()
                    .directory(config.directory)
                    .build()
                    .await
                    .map_err(|e| ConfigurationError::Provisioning {
                        backend: "File".to_string(),
                        reason: e.to_string(),
                    })?;
                let backend: Arc<dyn BackendTrait> = Arc::new(backend);
                Ok(Some(backend))
            }
            #[cfg(not(feature = "fs"))]
            Backend::File(_) => Err(ConfigurationError::UnsupportedBackend("File".to_string())),
            Backend::None => Ok(None),
        }
    }
}
