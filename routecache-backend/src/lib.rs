//! Cache pools and the ordered pool chain.
//!
//! Implement [`Backend`] to plug a new store into routecache. The decision
//! engine only ever talks to a [`CachePoolChain`], which fans operations out
//! over the configured pools.
mod backend;
pub mod chain;
mod error;
pub mod format;
pub mod metrics;

pub use backend::{Backend, BackendResult};
pub use chain::{CachePoolChain, ChainHit};
pub use error::{BackendError, ChainError, EmptyChain, FormatError};
pub use format::Format;

/// Outcome of removing an entry from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Entries were removed.
    Deleted(u32),
    /// Nothing was stored under the key.
    Missing,
}

impl DeleteStatus {
    /// Returns `true` if anything was removed.
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteStatus::Deleted(count) if *count > 0)
    }
}
