use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bincode::config::standard as bincode_config;
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::{DateTime, Utc};
use routecache_backend::{Backend, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::Error;

/// Directory used when none is configured.
pub const DEFAULT_DIRECTORY: &str = "routecache";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    data: Vec<u8>,
    expire: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expire.is_some_and(|expire| expire <= Utc::now())
    }
}

/// Cache pool stored as files in a directory.
///
/// Cloning is cheap; clones share the directory. Several processes may
/// share one directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    directory: PathBuf,
    label: BackendLabel,
}

impl FileBackend {
    /// Starts a builder.
    pub fn builder() -> FileBackendBuilder {
        FileBackendBuilder::default()
    }

    /// The pool directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &CacheKey) -> Result<PathBuf, Error> {
        let name = key.as_str();
        if name.len() < 2 || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidKey(name.to_owned()));
        }
        Ok(self.directory.join(&name[..2]).join(name))
    }

    async fn load(path: &Path) -> Result<Option<StoredEntry>, Error> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let (entry, _): (StoredEntry, _) = decode_from_slice(&bytes, bincode_config())?;
        Ok(Some(entry))
    }

    async fn remove_file(path: &Path) -> Result<bool, Error> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn prune_shard(shard: &Path) -> Result<u64, Error> {
        let mut removed = 0;
        let mut entries = fs::read_dir(shard).await?;
        while let Some(entry) = entries.next_entry().await? {
            // in-flight writes
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let expired = match Self::load(&path).await {
                Ok(stored) => stored.is_some_and(|stored| stored.is_expired()),
                Err(Error::Decode(error)) => {
                    tracing::warn!(path = %path.display(), %error, "removing corrupt entry");
                    true
                }
                Err(error) => return Err(error),
            };
            if expired && Self::remove_file(&path).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Builder for [`FileBackend`].
#[derive(Debug, Clone)]
pub struct FileBackendBuilder {
    directory: PathBuf,
    label: BackendLabel,
}

impl Default for FileBackendBuilder {
    fn default() -> Self {
        FileBackendBuilder {
            directory: std::env::temp_dir().join(DEFAULT_DIRECTORY),
            label: BackendLabel::new_static("file"),
        }
    }
}

impl FileBackendBuilder {
    /// Sets the pool directory. It is created if missing.
    pub fn directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.directory = directory.as_ref().to_path_buf();
        self
    }

    /// Sets the label used in logs.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the directory.
    ///
    /// Fails if it cannot be created or the path is not a directory.
    pub async fn build(self) -> Result<FileBackend, Error> {
        if let Err(error) = fs::create_dir_all(&self.directory).await {
            return Err(match fs::metadata(&self.directory).await {
                Ok(metadata) if !metadata.is_dir() => Error::NotADirectory(self.directory),
                _ => error.into(),
            });
        }
        if !fs::metadata(&self.directory).await?.is_dir() {
            return Err(Error::NotADirectory(self.directory));
        }
        tracing::debug!(directory = %self.directory.display(), "cache directory ready");
        Ok(FileBackend {
            directory: self.directory,
            label: self.label,
        })
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        let path = self.entry_path(key)?;
        let Some(entry) = Self::load(&path).await? else {
            return Ok(None);
        };
        if entry.is_expired() {
            tracing::trace!(%key, "expired entry");
            Self::remove_file(&path).await?;
            return Ok(None);
        }
        Ok(Some(CacheValue::new(Raw::from(entry.data), entry.expire)))
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        let path = self.entry_path(key)?;
        let value = match ttl {
            Some(_) => CacheValue::with_ttl(value.into_inner(), ttl),
            None => value,
        };
        let entry = StoredEntry {
            expire: value.expire(),
            data: value.into_inner().to_vec(),
        };
        let bytes = encode_to_vec(&entry, bincode_config()).map_err(Error::from)?;

        let Some(shard) = path.parent() else {
            return Err(Error::InvalidKey(key.to_string()).into());
        };
        fs::create_dir_all(shard).await.map_err(Error::from)?;
        let temp = shard.join(format!(
            ".{key}.{}.{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp, &bytes).await.map_err(Error::from)?;
        if let Err(error) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(Error::from(error).into());
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let path = self.entry_path(key)?;
        Ok(if Self::remove_file(&path).await? {
            DeleteStatus::Deleted(1)
        } else {
            DeleteStatus::Missing
        })
    }

    async fn prune(&self) -> BackendResult<()> {
        let mut removed = 0;
        let mut shards = fs::read_dir(&self.directory).await.map_err(Error::from)?;
        while let Some(shard) = shards.next_entry().await.map_err(Error::from)? {
            if shard.file_type().await.map_err(Error::from)?.is_dir() {
                removed += Self::prune_shard(&shard.path()).await?;
            }
        }
        tracing::debug!(directory = %self.directory.display(), removed, "pruned expired entries");
        Ok(())
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
