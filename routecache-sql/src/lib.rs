#![warn(missing_docs)]
//! SQL table cache pool for routecache.
//!
//! Entries live in a single table, created on construction when missing:
//!
//! | Column          | Type               | Meaning                          |
//! |-----------------|--------------------|----------------------------------|
//! | `item_id`       | `TEXT PRIMARY KEY` | cache key                        |
//! | `item_data`     | `BLOB`             | encoded response                 |
//! | `item_lifetime` | `INTEGER NULL`     | lifetime in seconds, `NULL` = ∞  |
//! | `item_time`     | `INTEGER`          | unix time of the write           |
//!
//! A pool that cannot create or find its table fails to build.
//!
//! ```no_run
//! # async fn run() -> Result<(), routecache_sql::Error> {
//! use routecache_sql::SqlBackend;
//!
//! let pool = SqlBackend::builder()
//!     .url("sqlite://cache.db")
//!     .table("routecache_items")
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;

pub use backend::{DEFAULT_TABLE, SqlBackend, SqlBackendBuilder};
pub use error::Error;
