use bytes::Bytes;
use http::request::Parts;
use routecache_core::{Params, RequestContext};

use crate::params::{parse_body, parse_form};
use crate::route::RouteMatch;

/// Request extension marking an internal dispatch.
///
/// Requests carrying it are sub-requests made while serving another
/// request and are never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubRequest;

/// An HTTP request as seen by the caching pipeline.
///
/// Owns a copy of the request head so it outlives the call to the inner
/// service. Query parameters are parsed on construction, body parameters
/// once a buffered body is attached.
#[derive(Debug, Clone)]
pub struct HttpRequestContext {
    parts: Parts,
    route: Option<RouteMatch>,
    query: Params,
    body: Params,
}

impl HttpRequestContext {
    /// Creates a context for a request head with no matched route.
    pub fn new(parts: Parts) -> Self {
        let query = parts.uri.query().map(parse_form).unwrap_or_default();
        HttpRequestContext {
            parts,
            route: None,
            query,
            body: Params::new(),
        }
    }

    /// Sets the matched route.
    pub fn with_route(mut self, route: Option<RouteMatch>) -> Self {
        self.route = route;
        self
    }

    /// Parses body parameters from `body`.
    pub fn with_body(mut self, body: &Bytes) -> Self {
        self.body = parse_body(&self.parts.headers, body);
        self
    }

    /// Request head.
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Matched route, if any.
    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }
}

impl RequestContext for HttpRequestContext {
    fn route(&self) -> Option<&str> {
        self.route.as_ref().map(RouteMatch::name)
    }

    fn handler(&self) -> Option<&str> {
        self.route.as_ref().map(RouteMatch::handler)
    }

    fn route_params(&self) -> &Params {
        static EMPTY: std::sync::LazyLock<Params> = std::sync::LazyLock::new(Params::new);
        match &self.route {
            Some(route) => route.params(),
            None => &EMPTY,
        }
    }

    fn query_params(&self) -> &Params {
        &self.query
    }

    fn body_params(&self) -> &Params {
        &self.body
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name)?.to_str().ok()
    }

    fn is_main_request(&self) -> bool {
        self.parts.extensions.get::<SubRequest>().is_none()
    }
}
