//! Stored values with expiry metadata.
//!
//! A [`CacheValue`] pairs the stored data with an optional absolute expiry
//! time. Backends that cannot expire entries on their own (the SQL pool) use
//! [`CacheValue::is_expired`] to decide whether a row still counts as a hit.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Cached data plus the moment it stops being valid.
///
/// `expire` of `None` means the value never expires.
///
/// ```
/// use routecache_core::CacheValue;
/// use std::time::Duration;
///
/// let value = CacheValue::with_ttl("payload", Some(Duration::from_secs(60)));
/// assert!(!value.is_expired());
/// assert_eq!(value.into_inner(), "payload");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    expire: Option<DateTime<Utc>>,
}

impl<T> CacheValue<T> {
    /// Creates a value that expires at `expire`.
    pub fn new(data: T, expire: Option<DateTime<Utc>>) -> Self {
        CacheValue { data, expire }
    }

    /// Creates a value that expires `ttl` from now.
    ///
    /// A zero or absent `ttl` gives a value without expiry. A `ttl` past the
    /// last representable instant saturates to [`DateTime::<Utc>::MAX_UTC`].
    pub fn with_ttl(data: T, ttl: Option<Duration>) -> Self {
        let expire = ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        CacheValue { data, expire }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the expiry time, if any.
    #[inline]
    pub fn expire(&self) -> Option<DateTime<Utc>> {
        self.expire
    }

    /// Consumes the value and returns the data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the data, keeping the expiry.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheValue<U> {
        CacheValue {
            data: f(self.data),
            expire: self.expire,
        }
    }

    /// Remaining time to live.
    ///
    /// `None` when there is no expiry or when it has already passed.
    pub fn ttl(&self) -> Option<Duration> {
        self.expire.and_then(|expire| {
            let remaining = expire.signed_duration_since(Utc::now());
            if remaining.num_seconds() > 0 {
                Some(Duration::from_secs(remaining.num_seconds() as u64))
            } else {
                None
            }
        })
    }

    /// Returns `true` once the expiry time has passed.
    pub fn is_expired(&self) -> bool {
        self.expire.is_some_and(|expire| expire <= Utc::now())
    }
}

/// Whole seconds of `ttl`, rounded up.
///
/// Pools that store lifetimes in seconds use this so that a sub-second
/// lifetime still expires.
pub fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0))
}
