//! Error types for cache pool operations.

use thiserror::Error;

/// Error raised by a single cache pool.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal pool error, state or computation error.
    ///
    /// Anything not caused by talking to a remote store.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Error talking to a remote store.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Cached value could not be encoded or decoded.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

/// Encoding or decoding failure of a cached value.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Value could not be encoded.
    #[error("failed to encode cached value: {0}")]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// Stored bytes could not be decoded.
    #[error("failed to decode cached value: {0}")]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// A pool chain was built without any pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cache pool chain requires at least one backend")]
pub struct EmptyChain;

/// Failure to bring a pool chain into service.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No pools were supplied.
    #[error(transparent)]
    Empty(#[from] EmptyChain),

    /// A pool failed its initial prune.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
