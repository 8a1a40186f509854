//! Error taxonomy of the caching engine.

use routecache_backend::{BackendError, ChainError, EmptyChain};
use routecache_core::UnknownStrategy;
use thiserror::Error;

/// Any failure raised while running the pipeline.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Caching was set up incorrectly.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A cache pool operation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The handler behind a request could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Setup errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The pool chain has no pools.
    #[error("cache pool chain requires at least one backend")]
    EmptyChain,

    /// A strategy name is not one of the known strategies.
    #[error("unknown cache strategy `{0}`")]
    UnknownStrategy(String),

    /// A directive lifetime cannot be honoured.
    #[error("invalid cache expiry: {0}")]
    InvalidExpiry(String),

    /// A configured backend kind is not compiled in or not known.
    #[error("unsupported cache backend `{0}`")]
    UnsupportedBackend(String),

    /// A backend could not prepare its storage.
    #[error("cache backend `{backend}` failed to provision: {reason}")]
    Provisioning {
        /// Backend label.
        backend: String,
        /// What went wrong.
        reason: String,
    },

    /// A handler reference is not of the form `Type::method`.
    #[error("invalid handler reference `{0}`")]
    InvalidHandler(String),

    /// A route definition is unusable.
    #[error("invalid route `{route}`: {reason}")]
    InvalidRoute {
        /// Route name.
        route: String,
        /// What went wrong.
        reason: String,
    },
}

impl From<EmptyChain> for ConfigurationError {
    fn from(_: EmptyChain) -> Self {
        ConfigurationError::EmptyChain
    }
}

impl From<UnknownStrategy> for ConfigurationError {
    fn from(err: UnknownStrategy) -> Self {
        ConfigurationError::UnknownStrategy(err.0)
    }
}

impl From<ChainError> for CacheError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Empty(empty) => CacheError::Configuration(empty.into()),
            ChainError::Backend(backend) => CacheError::Backend(backend),
        }
    }
}

/// The handler behind a request is unknown. Such requests are served
/// uncached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The handler reference is not of the form `Type::method`.
    #[error("malformed handler reference `{0}`")]
    MalformedHandler(String),

    /// No handler with this reference is registered.
    #[error("unknown handler `{0}`")]
    UnknownHandler(String),
}
