#![warn(missing_docs)]
//! # routecache-core
//!
//! Core types and traits for the routecache response-caching framework.
//!
//! This crate is **protocol-agnostic**. It defines what a cache directive is,
//! how a cache key is derived from a request, and the traits that
//! protocol-specific crates (like `routecache-http`) implement so the
//! decision engine in `routecache` can run against them.
//!
//! ## Building blocks
//!
//! - [`CacheDirective`] and [`Strategy`] - per-route caching configuration
//! - [`KeyDeriver`] and [`CacheKey`] - deterministic SHA-256 cache keys
//! - [`RequestContext`] - read access to the parts of a request that feed a key
//! - [`UserProvider`] - optional source of the current user's representation
//! - [`CacheableResponse`] - responses that can be stored and served back
//! - [`CacheValue`] - stored bytes plus expiry metadata

pub mod directive;
pub mod input;
pub mod key;
pub mod label;
pub mod request;
pub mod response;
pub mod user;
pub mod value;

pub use directive::{AllowList, CacheDirective, MAX_EXPIRY, Strategy, UnknownStrategy};
pub use input::{Params, RequestInput};
pub use key::{CacheKey, KeyDeriver};
pub use label::BackendLabel;
pub use request::RequestContext;
pub use response::CacheableResponse;
pub use user::{UserProvider, represent};
pub use value::{CacheValue, ttl_secs};

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` keeps clones of stored values reference-counted.
pub type Raw = bytes::Bytes;
