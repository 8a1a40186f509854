#![warn(missing_docs)]
//! # routecache-http
//!
//! HTTP binding for the routecache pipeline.
//!
//! - [`RouteTable`] names the route and handler of a request and captures
//!   its path parameters
//! - [`HttpRequestContext`] exposes route, query and body parameters and the
//!   control header to the pipeline
//! - [`CachedResponse`] is the stored form of a handler response
//! - [`BufferedBody`] lets the cache read a body without the client or the
//!   handler noticing
//! - [`ExtensionUser`] supplies the current user from request extensions
//!
//! The tower middleware built on these types lives in `routecache-tower`.

pub mod body;
pub mod params;
mod request;
mod response;
pub mod route;
mod user;

pub use body::{BufferedBody, Collected};
pub use request::{HttpRequestContext, SubRequest};
pub use response::{CachedResponse, DEFAULT_CACHE_STATUS_HEADER, set_cache_status};
pub use route::{Route, RouteMatch, RouteTable};
pub use user::ExtensionUser;
