#![warn(missing_docs)]
//! Redis cache pool for routecache.
//!
//! Entries are plain string keys holding the encoded response; expiry is
//! left to Redis (`EXPIRE`), so pruning is a no-op. The connection is opened
//! lazily on first use and shared through a
//! [`ConnectionManager`](redis::aio::ConnectionManager).
//!
//! ```no_run
//! use routecache_redis::RedisBackend;
//!
//! let pool = RedisBackend::builder()
//!     .server("redis://127.0.0.1:6379/0")
//!     .prefix("myapp:")
//!     .build()
//!     .expect("valid redis url");
//! ```

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{RedisBackend, RedisBackendBuilder};
#[doc(inline)]
pub use crate::error::Error;
