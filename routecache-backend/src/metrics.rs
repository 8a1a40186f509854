//! Pool metrics.
//!
//! Enable the `metrics` feature to record them through the [`metrics`]
//! facade. Every metric carries a `backend` label with the pool's label.
//!
//! - `routecache_backend_read_total`, `routecache_backend_read_duration_seconds`
//! - `routecache_backend_read_errors_total`
//! - `routecache_backend_write_total`, `routecache_backend_write_duration_seconds`
//! - `routecache_backend_write_errors_total`
//! - `routecache_backend_delete_errors_total`
//!
//! Without the feature every function here is an empty inline call.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Captures a start time when metrics are enabled; zero-sized otherwise.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts the timer.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Time since [`Timer::new`]; [`Duration::ZERO`] without metrics.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Pool reads.
    pub static ref BACKEND_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "routecache_backend_read_total",
            "Total number of reads per cache pool."
        );
        "routecache_backend_read_total"
    };
    /// Pool read latency.
    pub static ref BACKEND_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "routecache_backend_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache pool reads in seconds."
        );
        "routecache_backend_read_duration_seconds"
    };
    /// Failed pool reads.
    pub static ref BACKEND_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "routecache_backend_read_errors_total",
            "Total number of failed reads per cache pool."
        );
        "routecache_backend_read_errors_total"
    };
    /// Pool writes.
    pub static ref BACKEND_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "routecache_backend_write_total",
            "Total number of writes per cache pool."
        );
        "routecache_backend_write_total"
    };
    /// Pool write latency.
    pub static ref BACKEND_WRITE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "routecache_backend_write_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache pool writes in seconds."
        );
        "routecache_backend_write_duration_seconds"
    };
    /// Failed pool writes.
    pub static ref BACKEND_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "routecache_backend_write_errors_total",
            "Total number of failed writes per cache pool."
        );
        "routecache_backend_write_errors_total"
    };
    /// Failed pool deletes.
    pub static ref BACKEND_DELETE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "routecache_backend_delete_errors_total",
            "Total number of failed deletes per cache pool."
        );
        "routecache_backend_delete_errors_total"
    };
}

/// Records a pool read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(backend: &str, duration: Duration) {
    metrics::counter!(*BACKEND_READ_TOTAL, "backend" => backend.to_string()).increment(1);
    metrics::histogram!(*BACKEND_READ_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

/// Records a pool read (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_backend: &str, _duration: Duration) {}

/// Records a failed pool read.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read_error(backend: &str) {
    metrics::counter!(*BACKEND_READ_ERRORS, "backend" => backend.to_string()).increment(1);
}

/// Records a failed pool read (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read_error(_backend: &str) {}

/// Records a pool write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(backend: &str, duration: Duration) {
    metrics::counter!(*BACKEND_WRITE_TOTAL, "backend" => backend.to_string()).increment(1);
    metrics::histogram!(*BACKEND_WRITE_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

/// Records a pool write (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_backend: &str, _duration: Duration) {}

/// Records a failed pool write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write_error(backend: &str) {
    metrics::counter!(*BACKEND_WRITE_ERRORS, "backend" => backend.to_string()).increment(1);
}

/// Records a failed pool write (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write_error(_backend: &str) {}

/// Records a failed pool delete.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_delete_error(backend: &str) {
    metrics::counter!(*BACKEND_DELETE_ERRORS, "backend" => backend.to_string()).increment(1);
}

/// Records a failed pool delete (no-op without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_delete_error(_backend: &str) {}
