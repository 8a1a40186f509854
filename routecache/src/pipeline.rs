//! The three-phase interception pipeline.
//!
//! A request moves through:
//!
//! ```text
//! Start ─► DirectiveResolved ─► KeyDerived ─┬─► CacheHit            (handler skipped)
//!   │                                       └─► CacheMiss ─► PostHandler ─┬─► Populated
//!   └─► (no directive: pass through)                                     └─► SkipPopulate
//! ```
//!
//! 1. [`CachePipeline::pre_dispatch`] runs the eligibility gates, resolves the
//!    directive and reads the control header. An `invalidate` request has its
//!    entry deleted here.
//! 2. [`CachePipeline::pre_handler`] derives the key and reads the chain. On a
//!    hit the caller answers with the stored response instead of running the
//!    handler.
//! 3. [`CachePipeline::post_handler`] re-extracts the input, derives the key
//!    again and stores the response unless an entry already exists or the
//!    request asked to skip the cache.
//!
//! Read failures count as misses. Delete and write failures are returned.

use std::fmt;
use std::sync::Arc;

use routecache_backend::{BackendError, CachePoolChain, ChainHit};
use routecache_core::{
    CacheDirective, CacheKey, CacheValue, CacheableResponse, RequestContext, UserProvider,
};

use crate::metrics;
use crate::{
    AttributeExtractor, CacheError, ControlAction, DirectiveResolver, HandlerRef,
    InvalidationController, PipelineConfig,
};

/// Where a request stands in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// A directive applies to the request.
    DirectiveResolved,
    /// The key has been derived.
    KeyDerived(CacheKey),
    /// A stored response was found; the handler is skipped.
    CacheHit(CacheKey),
    /// Nothing usable was stored; the handler runs.
    CacheMiss(CacheKey),
    /// The handler's response was stored.
    Populated(CacheKey),
    /// The handler's response was not stored.
    SkipPopulate,
}

/// Cache status reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Served by the handler.
    Miss,
    /// The cache was bypassed on request.
    Bypass,
}

impl CacheStatus {
    /// Header value for this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// Per-request state carried between the phases.
#[derive(Debug, Clone)]
pub struct Interception {
    route: String,
    directive: CacheDirective,
    action: ControlAction,
    state: PipelineState,
}

impl Interception {
    /// Route identifier used as the key prefix.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The resolved directive.
    pub fn directive(&self) -> &CacheDirective {
        &self.directive
    }

    /// The control action requested by the client.
    pub fn action(&self) -> ControlAction {
        self.action
    }

    /// Current state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Status to report for the response.
    pub fn status(&self) -> CacheStatus {
        match (&self.state, self.action) {
            (PipelineState::CacheHit(_), _) => CacheStatus::Hit,
            (_, ControlAction::Skip) => CacheStatus::Bypass,
            _ => CacheStatus::Miss,
        }
    }

    fn transition(&mut self, state: PipelineState) {
        tracing::trace!(route = %self.route, from = ?self.state, to = ?state, "transition");
        self.state = state;
    }
}

/// Result of the pre-handler lookup.
#[derive(Debug)]
pub enum Lookup<Res> {
    /// Serve this response and skip the handler.
    Hit(Res),
    /// Run the handler.
    Miss,
}

/// Result of the post-handler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    /// The response was stored.
    Populated,
    /// Nothing was stored.
    Skipped,
}

/// Caching decision engine wrapped around a request handler.
///
/// Generic over the request type `Q` so user providers can read whatever
/// the protocol binding exposes.
pub struct CachePipeline<Q: ?Sized> {
    chain: CachePoolChain,
    resolver: Arc<dyn DirectiveResolver>,
    users: Option<Arc<dyn UserProvider<Q>>>,
    config: PipelineConfig,
}

impl<Q: ?Sized> Clone for CachePipeline<Q> {
    fn clone(&self) -> Self {
        CachePipeline {
            chain: self.chain.clone(),
            resolver: Arc::clone(&self.resolver),
            users: self.users.clone(),
            config: self.config.clone(),
        }
    }
}

impl<Q: ?Sized> fmt::Debug for CachePipeline<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePipeline")
            .field("chain", &self.chain)
            .field("users", &self.users.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl<Q> CachePipeline<Q>
where
    Q: RequestContext + ?Sized,
{
    /// Creates a pipeline without a user provider.
    pub fn new(
        chain: CachePoolChain,
        resolver: Arc<dyn DirectiveResolver>,
        config: PipelineConfig,
    ) -> Self {
        CachePipeline {
            chain,
            resolver,
            users: None,
            config,
        }
    }

    /// Sets the provider of the current user.
    pub fn with_user_provider(mut self, users: Arc<dyn UserProvider<Q>>) -> Self {
        self.users = Some(users);
        self
    }

    /// The pool chain.
    pub fn chain(&self) -> &CachePoolChain {
        &self.chain
    }

    /// Pipeline settings.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Directive that applies to `request`, after the eligibility gates.
    ///
    /// `None` means the request passes through untouched.
    pub fn directive_for(&self, request: &Q) -> Option<CacheDirective> {
        if !self.config.enabled {
            tracing::trace!("caching disabled");
            return None;
        }
        if !request.is_main_request() {
            tracing::trace!("sub-request, not cached");
            return None;
        }
        let handler = request.handler()?;
        let resolved = handler
            .parse::<HandlerRef>()
            .and_then(|handler| self.resolver.resolve(&handler));
        match resolved {
            Ok(directive) => directive,
            Err(error) => {
                tracing::debug!(%error, "handler not resolvable, not cached");
                None
            }
        }
    }

    /// Phase 1, on request received.
    ///
    /// Returns `None` when the request is not cached at all.
    #[tracing::instrument(skip_all, level = "debug", fields(route = request.route()))]
    pub async fn pre_dispatch(&self, request: &Q) -> Result<Option<Interception>, CacheError> {
        let Some(directive) = self.directive_for(request) else {
            return Ok(None);
        };
        let Some(route) = request.route() else {
            tracing::debug!("no route identifier, not cached");
            return Ok(None);
        };
        let action = InvalidationController::resolve(request.header(&self.config.control_header));
        tracing::debug!(strategy = %directive.strategy(), ?action, "directive resolved");

        let interception = Interception {
            route: route.to_owned(),
            directive,
            action,
            state: PipelineState::DirectiveResolved,
        };

        if action == ControlAction::Invalidate {
            let key = self.derive_key(&interception, request);
            let deleted = self.chain.delete(&key).await.inspect_err(|_| {
                metrics::record_error(&interception.route, "pre_dispatch");
            })?;
            metrics::record_invalidate(&interception.route);
            tracing::debug!(%key, deleted, "entry invalidated");
        }
        Ok(Some(interception))
    }

    /// Phase 2, before the handler runs.
    #[tracing::instrument(skip_all, level = "debug", fields(route = interception.route()))]
    pub async fn pre_handler<Res>(
        &self,
        interception: &mut Interception,
        request: &Q,
    ) -> Result<Lookup<Res>, CacheError>
    where
        Res: CacheableResponse,
    {
        let key = self.derive_key(interception, request);
        interception.transition(PipelineState::KeyDerived(key.clone()));

        if interception.action.bypasses_read() {
            tracing::debug!(action = ?interception.action, "cache read bypassed");
            interception.transition(PipelineState::CacheMiss(key));
            metrics::record_lookup(&interception.route, interception.status());
            return Ok(Lookup::Miss);
        }

        let lookup = match self.read(&key).await.and_then(|hit| self.decode(hit)) {
            Ok(Some(response)) => {
                tracing::debug!(%key, "cache hit");
                interception.transition(PipelineState::CacheHit(key));
                Lookup::Hit(response)
            }
            Ok(None) => {
                tracing::debug!(%key, "cache miss");
                interception.transition(PipelineState::CacheMiss(key));
                Lookup::Miss
            }
            Err(error) => {
                tracing::warn!(%key, %error, "cache read failed, treating as miss");
                metrics::record_error(&interception.route, "pre_handler");
                interception.transition(PipelineState::CacheMiss(key));
                Lookup::Miss
            }
        };
        metrics::record_lookup(&interception.route, interception.status());
        Ok(lookup)
    }

    /// Phase 3, after the handler produced `response`.
    #[tracing::instrument(skip_all, level = "debug", fields(route = interception.route()))]
    pub async fn post_handler<Res>(
        &self,
        interception: &mut Interception,
        request: &Q,
        response: &Res,
    ) -> Result<Population, CacheError>
    where
        Res: CacheableResponse,
    {
        if !response.is_successful() {
            tracing::debug!("unsuccessful response, not stored");
            interception.transition(PipelineState::SkipPopulate);
            return Ok(Population::Skipped);
        }
        if interception.action.forbids_write() {
            tracing::debug!("cache skipped on request, not stored");
            interception.transition(PipelineState::SkipPopulate);
            return Ok(Population::Skipped);
        }

        let key = self.derive_key(interception, request);
        let exists = match self.read(&key).await {
            Ok(hit) => hit.is_some(),
            Err(error) => {
                tracing::warn!(%key, %error, "existence check failed, treating as absent");
                false
            }
        };
        if exists {
            tracing::debug!(%key, "entry already stored");
            interception.transition(PipelineState::SkipPopulate);
            return Ok(Population::Skipped);
        }

        let ttl = interception.directive.ttl();
        let stored = match self.config.value_format.encode(response) {
            Ok(raw) => self.chain.set(&key, CacheValue::with_ttl(raw, ttl), ttl).await,
            Err(error) => Err(BackendError::from(error)),
        };
        if let Err(error) = stored {
            metrics::record_error(&interception.route, "post_handler");
            return Err(error.into());
        }
        metrics::record_populate(&interception.route);
        tracing::debug!(%key, ?ttl, "response stored");
        interception.transition(PipelineState::Populated(key));
        Ok(Population::Populated)
    }

    fn derive_key(&self, interception: &Interception, request: &Q) -> CacheKey {
        let input = AttributeExtractor::extract(
            &interception.directive,
            request,
            self.users.as_deref(),
        );
        interception.directive.key(&interception.route, &input)
    }

    async fn read(&self, key: &CacheKey) -> Result<Option<ChainHit>, BackendError> {
        let hit = self.chain.get(key).await?;
        Ok(hit.filter(|hit| {
            let expired = hit.value.is_expired();
            if expired {
                tracing::trace!(backend = %hit.source, "stored entry expired");
            }
            !expired
        }))
    }

    fn decode<Res: CacheableResponse>(
        &self,
        hit: Option<ChainHit>,
    ) -> Result<Option<Res>, BackendError> {
        match hit {
            Some(hit) => Ok(Some(self.config.value_format.decode(hit.value.data())?)),
            None => Ok(None),
        }
    }
}
