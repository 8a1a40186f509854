//! Matching request paths to named routes.
//!
//! A [`RouteTable`] plays the part of the application's router for the
//! cache layer: it names the route a request belongs to (the route
//! identifier that prefixes every cache key), names the handler the request
//! dispatches to, and captures path parameters.
//!
//! # Pattern Syntax
//!
//! Patterns use [actix-router](https://docs.rs/actix-router):
//!
//! - `{name}` captures a path segment (characters until `/`)
//! - `{name:regex}` captures with a regex constraint (e.g., `{id:\d+}`)
//! - `{tail}*` captures the remaining path
//!
//! ```
//! use http::Method;
//! use routecache_http::{Route, RouteTable};
//!
//! let table = RouteTable::new()
//!     .route(Route::new("task_show", "/tasks/{id}", "TaskController::show").method(Method::GET));
//!
//! let matched = table.find(&Method::GET, "/tasks/42").unwrap();
//! assert_eq!(matched.name(), "task_show");
//! assert_eq!(matched.params()["id"], "42");
//! ```

use actix_router::ResourceDef;
use http::Method;
use routecache_core::Params;
use serde_json::Value;

/// A named route.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    resource: ResourceDef,
    methods: Vec<Method>,
    handler: String,
}

impl Route {
    /// Creates a route matching `pattern` for any method.
    pub fn new(name: impl Into<String>, pattern: &str, handler: impl Into<String>) -> Self {
        Route {
            name: name.into(),
            resource: ResourceDef::new(pattern),
            methods: Vec::new(),
            handler: handler.into(),
        }
    }

    /// Restricts the route to `method`. May be called more than once.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler reference (`Type::method`).
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Path pattern.
    pub fn pattern(&self) -> &str {
        self.resource.pattern().unwrap_or_default()
    }

    fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    fn capture(&self, path: &str) -> Option<Params> {
        let mut path = actix_router::Path::new(path);
        if !self.resource.capture_match_info(&mut path) {
            return None;
        }
        Some(
            path.iter()
                .map(|(name, value)| (name.to_owned(), Value::String(value.to_owned())))
                .collect(),
        )
    }
}

/// The route a request matched.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    name: String,
    handler: String,
    params: Params,
}

impl RouteMatch {
    /// Creates a match by hand, for requests routed elsewhere.
    pub fn new(name: impl Into<String>, handler: impl Into<String>, params: Params) -> Self {
        RouteMatch {
            name: name.into(),
            handler: handler.into(),
            params,
        }
    }

    /// Route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler reference.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Captured path parameters, in pattern order.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Ordered set of routes; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        RouteTable::default()
    }

    /// Appends `route`.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Appends `route` in place.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Routes in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// `true` when no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the route for `method` and `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.allows(method))
            .find_map(|route| {
                route.capture(path).map(|params| RouteMatch {
                    name: route.name.clone(),
                    handler: route.handler.clone(),
                    params,
                })
            })
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        RouteTable {
            routes: iter.into_iter().collect(),
        }
    }
}
