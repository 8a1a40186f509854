//! Builder for [`MokaBackend`].

use std::time::{Duration, Instant};

use chrono::Utc;
use moka::Expiry;
use moka::future::Cache;
use routecache_core::{BackendLabel, CacheKey, CacheValue, MAX_EXPIRY, Raw};

use crate::backend::MokaBackend;

/// Per-entry expiry read from [`CacheValue::expire`].
#[derive(Clone, Copy, Debug)]
struct Expiration;

impl Expiry<CacheKey, CacheValue<Raw>> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheValue<Raw>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Self::remaining(value)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheValue<Raw>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // the replaced entry's deadline must not carry over
        Self::remaining(value)
    }
}

impl Expiration {
    fn remaining(value: &CacheValue<Raw>) -> Option<Duration> {
        value.expire().map(|expire| {
            let millis = (expire - Utc::now()).num_milliseconds();
            Duration::from_millis(millis.max(0) as u64).min(MAX_EXPIRY)
        })
    }
}

/// How the pool's size is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// At most this many entries.
    Entries(u64),
    /// Roughly this many bytes of keys and values.
    Bytes(u64),
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Entries(10_000)
    }
}

/// Builder for [`MokaBackend`].
#[derive(Debug, Clone)]
pub struct MokaBackendBuilder {
    capacity: Capacity,
    label: BackendLabel,
}

impl Default for MokaBackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MokaBackendBuilder {
    /// Creates a builder for a 10 000 entry pool labelled `moka`.
    pub fn new() -> Self {
        MokaBackendBuilder {
            capacity: Capacity::default(),
            label: BackendLabel::new_static("moka"),
        }
    }

    /// Bounds the pool by entry count.
    pub fn max_entries(mut self, entries: u64) -> Self {
        self.capacity = Capacity::Entries(entries);
        self
    }

    /// Bounds the pool by approximate memory use.
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.capacity = Capacity::Bytes(bytes);
        self
    }

    /// Sets the label used in logs.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Builds the pool.
    pub fn build(self) -> MokaBackend {
        let cache = match self.capacity {
            Capacity::Entries(entries) => Cache::builder()
                .max_capacity(entries)
                .expire_after(Expiration)
                .build(),
            Capacity::Bytes(bytes) => Cache::builder()
                .max_capacity(bytes)
                .weigher(|key: &CacheKey, value: &CacheValue<Raw>| {
                    let size = key.as_str().len() + value.data().len();
                    u32::try_from(size).unwrap_or(u32::MAX)
                })
                .expire_after(Expiration)
                .build(),
        };
        MokaBackend {
            cache,
            label: self.label,
        }
    }
}
