//! In-memory cache pool backed by [Moka](https://github.com/moka-rs/moka).
//!
//! Entries expire at their [`CacheValue`](routecache_core::CacheValue)
//! expiry; entries without one live until evicted for capacity.
//!
//! ```
//! use routecache_moka::MokaBackend;
//!
//! let pool = MokaBackend::builder().max_entries(10_000).label("local").build();
//! ```
mod backend;
mod builder;

pub use backend::MokaBackend;
pub use builder::{Capacity, MokaBackendBuilder};
