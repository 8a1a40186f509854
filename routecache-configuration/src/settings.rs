use std::time::Duration;

use http::Method;
use routecache::{
    CacheDirective, CachePoolChain, ConfigurationError, DirectiveRegistry, MAX_EXPIRY,
    PipelineConfig, Strategy,
};
use routecache::config::{DEFAULT_CONTROL_HEADER, DEFAULT_MAX_BODY_SIZE};
use routecache_backend::{ChainError, Format};
use routecache_http::{Route, RouteTable};
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::ConfigError;

/// How a route's responses are cached.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DirectiveSettings {
    /// Key strategy name (`GET`, `POST`, `USER`, `MIXED` or `ALL`).
    /// `MIXED` when omitted.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Lifetime of stored responses, e.g. `60s` or `1h 30m`.
    #[serde(default, with = "humantime_serde")]
    pub expires: Option<Duration>,
    /// Top-level input names allowed in the key.
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl DirectiveSettings {
    /// The key strategy.
    pub fn strategy(&self) -> Result<Strategy, ConfigurationError> {
        match &self.strategy {
            Some(name) => Ok(name.parse::<Strategy>()?),
            None => Ok(Strategy::default()),
        }
    }

    /// Builds the directive.
    ///
    /// Fails on an unknown strategy or a lifetime longer than [`MAX_EXPIRY`].
    pub fn to_directive(&self) -> Result<CacheDirective, ConfigurationError> {
        if let Some(expires) = self.expires.filter(|expires| *expires > MAX_EXPIRY) {
            return Err(ConfigurationError::InvalidExpiry(format!(
                "{}s exceeds the maximum of {}s",
                expires.as_secs(),
                MAX_EXPIRY.as_secs(),
            )));
        }
        Ok(CacheDirective::new(self.strategy()?)
            .expires_opt(self.expires)
            .with_attributes(self.attributes.iter().cloned()))
    }
}

/// A named route and its caching.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteSettings {
    /// Route name; prefixes every key of the route.
    pub name: String,
    /// Path pattern, e.g. `/tasks/{id}`.
    pub path: String,
    /// Methods served by the route. Empty means any.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Handler reference, `Type::method`.
    pub handler: String,
    /// Caching of the handler; absent means never cached.
    #[serde(default)]
    pub cache: Option<DirectiveSettings>,
}

impl RouteSettings {
    fn to_route(&self) -> Result<Route, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidRoute {
            route: self.name.clone(),
            reason,
        };
        if !self.path.starts_with('/') {
            return Err(invalid(format!("path `{}` must start with `/`", self.path)));
        }
        if !braces_balanced(&self.path) {
            return Err(invalid(format!("unbalanced braces in path `{}`", self.path)));
        }
        let mut route = Route::new(&self.name, &self.path, &self.handler);
        for method in &self.methods {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| invalid(format!("invalid method `{method}`")))?;
            route = route.method(method);
        }
        Ok(route)
    }
}

fn braces_balanced(path: &str) -> bool {
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Top-level configuration document.
///
/// ```
/// use routecache_configuration::CacheSettings;
///
/// let settings = CacheSettings::from_yaml(r#"
/// backends:
///   - type: Moka
///     max_capacity: 1000
/// routes:
///   - name: task_show
///     path: /tasks/{id}
///     methods: [GET]
///     handler: TaskController::show
///     cache:
///       strategy: GET
///       expires: 60s
/// "#).unwrap();
///
/// assert_eq!(settings.routes.len(), 1);
/// assert!(settings.enabled);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CacheSettings {
    /// Master switch.
    #[serde(default = "CacheSettings::default_enabled")]
    pub enabled: bool,
    /// Request header read by the invalidation controller.
    #[serde(default = "CacheSettings::default_control_header")]
    pub control_header: String,
    /// Encoding of stored responses.
    #[serde(default)]
    pub value_format: Format,
    /// Largest body read into memory; `null` removes the cap.
    #[serde(default = "CacheSettings::default_max_body_size")]
    pub max_body_size: Option<usize>,
    /// Pools in read order; `null` entries are ignored.
    #[serde(default)]
    pub backends: Vec<Option<Backend>>,
    /// Routes in match order.
    #[serde(default)]
    pub routes: Vec<RouteSettings>,
}

impl CacheSettings {
    fn default_enabled() -> bool {
        true
    }

    fn default_control_header() -> String {
        DEFAULT_CONTROL_HEADER.to_owned()
    }

    fn default_max_body_size() -> Option<usize> {
        Some(DEFAULT_MAX_BODY_SIZE)
    }

    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Pipeline settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            enabled: self.enabled,
            control_header: self.control_header.clone(),
            value_format: self.value_format,
            max_body_size: self.max_body_size,
        }
    }

    /// Builds the route table and the directive registry.
    pub fn route_table(&self) -> Result<(RouteTable, DirectiveRegistry), ConfigurationError> {
        let mut routes = RouteTable::new();
        let mut directives = DirectiveRegistry::new();
        for settings in &self.routes {
            routes.push(settings.to_route()?);
            let directive = settings
                .cache
                .as_ref()
                .map(DirectiveSettings::to_directive)
                .transpose()?;
            directives.insert(&settings.handler, directive)?;
        }
        Ok((routes, directives))
    }

    /// Builds every pool, activates the chain and assembles the routing.
    pub async fn build(self) -> Result<Built, ConfigError> {
        let (routes, directives) = self.route_table()?;
        let pipeline_config = self.pipeline_config();

        let mut pools = Vec::new();
        for backend in self.backends.into_iter().flatten() {
            let kind = backend.kind();
            match backend.into_backend().await? {
                Some(pool) => pools.push(pool),
                None => tracing::debug!(kind, "pool switched off"),
            }
        }

        let chain = CachePoolChain::activate(pools)
            .await
            .map_err(|error| match error {
                ChainError::Empty(empty) => ConfigurationError::from(empty),
                ChainError::Backend(error) => ConfigurationError::Provisioning {
                    backend: "chain".to_string(),
                    reason: error.to_string(),
                },
            })?;
        tracing::info!(pools = ?chain.labels(), routes = routes.len(), "cache configured");

        Ok(Built {
            chain,
            routes,
            directives,
            pipeline_config,
        })
    }
}

/// Everything needed to assemble the cache layer.
#[derive(Debug)]
pub struct Built {
    /// Activated pool chain.
    pub chain: CachePoolChain,
    /// Route table.
    pub routes: RouteTable,
    /// Per-handler directives.
    pub directives: DirectiveRegistry,
    /// Pipeline settings.
    pub pipeline_config: PipelineConfig,
}
