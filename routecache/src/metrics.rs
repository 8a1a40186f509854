//! Pipeline metrics.
//!
//! Recorded through the [`metrics`] facade when the `metrics` feature is on;
//! every counter carries a `route` label. Pool-level metrics come from
//! `routecache_backend::metrics`.

use crate::pipeline::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Requests answered from the cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_hit_total",
            "Total number of cache hit events."
        );
        "routecache_cache_hit_total"
    };
    /// Requests the handler answered.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_miss_total",
            "Total number of cache miss events."
        );
        "routecache_cache_miss_total"
    };
    /// Requests that skipped the cache on request.
    pub static ref CACHE_BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_bypass_total",
            "Total number of requests that bypassed the cache."
        );
        "routecache_cache_bypass_total"
    };
    /// Responses stored.
    pub static ref CACHE_POPULATE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_populate_total",
            "Total number of responses stored in the cache."
        );
        "routecache_cache_populate_total"
    };
    /// Entries invalidated on request.
    pub static ref CACHE_INVALIDATE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_invalidate_total",
            "Total number of invalidation requests."
        );
        "routecache_cache_invalidate_total"
    };
    /// Cache operations that failed in a pipeline phase.
    pub static ref CACHE_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "routecache_cache_errors_total",
            "Total number of failed cache operations per pipeline phase."
        );
        "routecache_cache_errors_total"
    };
}

/// Records the outcome of a lookup.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_lookup(route: &str, status: CacheStatus) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Bypass => *CACHE_BYPASS_COUNTER,
    };
    metrics::counter!(counter, "route" => route.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_lookup(_route: &str, _status: CacheStatus) {}

/// Records a stored response.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_populate(route: &str) {
    metrics::counter!(*CACHE_POPULATE_COUNTER, "route" => route.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_populate(_route: &str) {}

/// Records an invalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_invalidate(route: &str) {
    metrics::counter!(*CACHE_INVALIDATE_COUNTER, "route" => route.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_invalidate(_route: &str) {}

/// Records a failed cache operation in `phase`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_error(route: &str, phase: &'static str) {
    metrics::counter!(*CACHE_ERROR_COUNTER, "route" => route.to_string(), "phase" => phase)
        .increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_error(_route: &str, _phase: &'static str) {}
