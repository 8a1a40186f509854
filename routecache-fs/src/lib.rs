#![warn(missing_docs)]
//! File-system cache pool for routecache.
//!
//! Entries live under one directory, one file per key:
//!
//! ```text
//! <directory>/
//!   3f/
//!     3fa9…c1    bincode `{ data, expire }`
//!   a0/
//!     a07e…42
//! ```
//!
//! The directory is created when the pool is built; a pool that cannot
//! create it fails to build.
//!
//! ```no_run
//! # async fn run() -> Result<(), routecache_fs::Error> {
//! use routecache_fs::FileBackend;
//!
//! let pool = FileBackend::builder()
//!     .directory("/var/cache/routecache")
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;

pub use backend::{DEFAULT_DIRECTORY, FileBackend, FileBackendBuilder};
pub use error::Error;
