use std::fmt;
use std::sync::Arc;

use http::HeaderName;
use routecache::{
    CachePipeline, CachePoolChain, ConfigurationError, DirectiveRegistry, DirectiveResolver,
    PipelineConfig, UserProvider,
};
use routecache_http::{DEFAULT_CACHE_STATUS_HEADER, HttpRequestContext, RouteTable};
use tower::Layer;

use crate::service::CacheService;

/// Tower layer that caches responses of directive-bearing routes.
///
/// Built with [`Cache::builder`]; cloning is cheap.
#[derive(Clone)]
pub struct Cache {
    pipeline: CachePipeline<HttpRequestContext>,
    routes: Arc<RouteTable>,
    status_header: HeaderName,
}

impl Cache {
    /// Starts building a layer.
    pub fn builder() -> CacheBuilder {
        CacheBuilder::default()
    }

    /// Creates a layer from an assembled pipeline.
    pub fn new(pipeline: CachePipeline<HttpRequestContext>, routes: RouteTable) -> Self {
        Cache {
            pipeline,
            routes: Arc::new(routes),
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }

    /// The pipeline driving the layer.
    pub fn pipeline(&self) -> &CachePipeline<HttpRequestContext> {
        &self.pipeline
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("pipeline", &self.pipeline)
            .field("routes", &self.routes.len())
            .field("status_header", &self.status_header)
            .finish()
    }
}

impl<S> Layer<S> for Cache {
    type Service = CacheService<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        CacheService::new(
            upstream,
            self.pipeline.clone(),
            Arc::clone(&self.routes),
            self.status_header.clone(),
        )
    }
}

/// Builder for [`Cache`].
pub struct CacheBuilder {
    chain: Option<CachePoolChain>,
    routes: RouteTable,
    directives: Arc<dyn DirectiveResolver>,
    users: Option<Arc<dyn UserProvider<HttpRequestContext>>>,
    config: PipelineConfig,
    status_header: HeaderName,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        CacheBuilder {
            chain: None,
            routes: RouteTable::new(),
            directives: Arc::new(DirectiveRegistry::new()),
            users: None,
            config: PipelineConfig::default(),
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }
}

impl CacheBuilder {
    /// Pools to read from and write to.
    pub fn chain(self, chain: CachePoolChain) -> Self {
        CacheBuilder {
            chain: Some(chain),
            ..self
        }
    }

    /// Route table naming routes and handlers.
    pub fn routes(self, routes: RouteTable) -> Self {
        CacheBuilder { routes, ..self }
    }

    /// Source of per-handler directives.
    pub fn directives<R>(self, directives: R) -> Self
    where
        R: DirectiveResolver + 'static,
    {
        CacheBuilder {
            directives: Arc::new(directives),
            ..self
        }
    }

    /// Provider of the current user, used by the `USER` and `MIXED` strategies.
    pub fn user_provider<U>(self, users: U) -> Self
    where
        U: UserProvider<HttpRequestContext> + 'static,
    {
        CacheBuilder {
            users: Some(Arc::new(users)),
            ..self
        }
    }

    /// Pipeline settings.
    pub fn config(self, config: PipelineConfig) -> Self {
        CacheBuilder { config, ..self }
    }

    /// Response header carrying the cache status.
    pub fn status_header(self, status_header: HeaderName) -> Self {
        CacheBuilder {
            status_header,
            ..self
        }
    }

    /// Builds the layer.
    ///
    /// Fails when no pool chain was given.
    pub fn build(self) -> Result<Cache, ConfigurationError> {
        let chain = self.chain.ok_or(ConfigurationError::EmptyChain)?;
        let mut pipeline = CachePipeline::new(chain, self.directives, self.config);
        if let Some(users) = self.users {
            pipeline = pipeline.with_user_provider(users);
        }
        Ok(Cache {
            pipeline,
            routes: Arc::new(self.routes),
            status_header: self.status_header,
        })
    }
}
