#![warn(missing_docs)]
//! # routecache-tower
//!
//! Tower middleware running the routecache pipeline around an HTTP service.
//!
//! ```no_run
//! use http::Method;
//! use routecache::{Backend, CacheDirective, CachePoolChain, DirectiveRegistry, Strategy};
//! use routecache_moka::MokaBackend;
//! use routecache_http::{Route, RouteTable};
//! use routecache_tower::Cache;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let memory: Arc<dyn Backend> = Arc::new(MokaBackend::builder().build());
//! let chain = CachePoolChain::new(vec![memory])?;
//! let routes = RouteTable::new()
//!     .route(Route::new("task_show", "/tasks/{id}", "TaskController::show").method(Method::GET));
//! let directives = DirectiveRegistry::new().cached(
//!     "TaskController::show",
//!     CacheDirective::new(Strategy::Get).expires(Duration::from_secs(60)),
//! )?;
//!
//! let layer = Cache::builder()
//!     .chain(chain)
//!     .routes(routes)
//!     .directives(directives)
//!     .build()?;
//! # let _ = layer;
//! # Ok(())
//! # }
//! ```
//!
//! Responses of cached routes carry an `x-cache-status` header (`HIT`,
//! `MISS` or `BYPASS`).

/// Tower layer and builder.
pub mod layer;
/// The Tower service that performs caching.
pub mod service;

pub use layer::{Cache, CacheBuilder};
pub use routecache_http::DEFAULT_CACHE_STATUS_HEADER;
pub use service::CacheService;
