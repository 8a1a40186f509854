#![warn(missing_docs)]
//! # routecache
//!
//! Route-directed response caching. Each handler may carry a
//! [`CacheDirective`] saying how to build a key from the request and how long
//! the response lives; [`CachePipeline`] intercepts requests at three points
//! and serves, stores or invalidates responses accordingly.
//!
//! Clients steer caching per request through a control header (`N-CACHE` by
//! default): `invalidate` deletes the stored entry and stores the fresh
//! response, `skip` bypasses the cache entirely.
//!
//! Protocol bindings live in `routecache-http` and `routecache-tower`;
//! pools live in `routecache-moka`, `routecache-redis`, `routecache-sql` and
//! `routecache-fs`. The `metrics` feature records hit, miss, bypass and
//! populate counters per route (see [`metrics`]).

pub mod config;
pub mod control;
pub mod error;
pub mod extractor;
pub mod metrics;
pub mod pipeline;
pub mod resolver;

pub use config::PipelineConfig;
pub use control::{ControlAction, InvalidationController};
pub use error::{CacheError, ConfigurationError, ResolutionError};
pub use extractor::AttributeExtractor;
pub use pipeline::{CachePipeline, CacheStatus, Interception, Lookup, PipelineState, Population};
pub use resolver::{DirectiveRegistry, DirectiveResolver, HandlerRef};

pub use routecache_backend::{Backend, CachePoolChain, Format};
pub use routecache_core::{
    AllowList, CacheDirective, CacheKey, CacheableResponse, KeyDeriver, MAX_EXPIRY, Params,
    RequestContext, RequestInput, Strategy, UserProvider,
};
