use std::sync::Arc;

use futures::future::BoxFuture;
use http::{HeaderName, Request, Response};
use http_body::Body as HttpBody;
use routecache::{CachePipeline, CacheStatus, Interception, Lookup, RequestContext};
use routecache_http::{
    BufferedBody, CachedResponse, Collected, HttpRequestContext, RouteTable, set_cache_status,
};
use tower::Service;

/// Service produced by the [`Cache`](crate::Cache) layer.
///
/// Requests whose handler carries no directive go straight to the upstream
/// service with their body untouched. Cache failures never fail a request:
/// they are logged and the request is served uncached.
pub struct CacheService<S> {
    upstream: S,
    pipeline: CachePipeline<HttpRequestContext>,
    routes: Arc<RouteTable>,
    status_header: HeaderName,
}

impl<S> CacheService<S> {
    /// Wraps `upstream`.
    pub fn new(
        upstream: S,
        pipeline: CachePipeline<HttpRequestContext>,
        routes: Arc<RouteTable>,
        status_header: HeaderName,
    ) -> Self {
        CacheService {
            upstream,
            pipeline,
            routes,
            status_header,
        }
    }
}

impl<S> Clone for CacheService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            pipeline: self.pipeline.clone(),
            routes: Arc::clone(&self.routes),
            status_header: self.status_header.clone(),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CacheService<S>
where
    S: Service<Request<BufferedBody<ReqBody>>, Response = Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    ReqBody: HttpBody + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Send,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Send,
{
    type Response = Response<BufferedBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The ready instance serves this request; the clone stays behind.
        let clone = self.upstream.clone();
        let upstream = std::mem::replace(&mut self.upstream, clone);
        let flow = Flow {
            upstream,
            pipeline: self.pipeline.clone(),
            routes: Arc::clone(&self.routes),
            status_header: self.status_header.clone(),
        };
        Box::pin(flow.run(request))
    }
}

struct Flow<S> {
    upstream: S,
    pipeline: CachePipeline<HttpRequestContext>,
    routes: Arc<RouteTable>,
    status_header: HeaderName,
}

impl<S> Flow<S> {
    async fn run<ReqBody, ResBody>(
        mut self,
        request: Request<ReqBody>,
    ) -> Result<Response<BufferedBody<ResBody>>, S::Error>
    where
        S: Service<Request<BufferedBody<ReqBody>>, Response = Response<ResBody>>,
        ReqBody: HttpBody,
        ResBody: HttpBody,
    {
        let (parts, body) = request.into_parts();
        let route = self.routes.find(&parts.method, parts.uri.path());
        let context = HttpRequestContext::new(parts.clone()).with_route(route);

        let Some(directive) = self.pipeline.directive_for(&context) else {
            let request = Request::from_parts(parts, BufferedBody::Passthrough(body));
            return self.passthrough(request).await;
        };

        let limit = self.pipeline.config().max_body_size;
        let (context, body) = if directive.strategy().reads_body() {
            match BufferedBody::buffer_limited(body, limit).await {
                Collected::Complete(bytes) => (
                    context.with_body(&bytes),
                    BufferedBody::Complete(Some(bytes)),
                ),
                Collected::Failed(body) => {
                    tracing::warn!(
                        route = context.route(),
                        "request body could not be read, serving uncached"
                    );
                    return self.passthrough(Request::from_parts(parts, body)).await;
                }
                Collected::Oversized(body) => {
                    tracing::debug!(
                        route = context.route(),
                        ?limit,
                        "request body over the size limit, serving uncached"
                    );
                    return self.passthrough(Request::from_parts(parts, body)).await;
                }
            }
        } else {
            (context, BufferedBody::Passthrough(body))
        };
        let request = Request::from_parts(parts, body);

        let mut interception = match self.pipeline.pre_dispatch(&context).await {
            Ok(Some(interception)) => interception,
            Ok(None) => return self.passthrough(request).await,
            Err(error) => {
                tracing::warn!(%error, route = context.route(), "cache unavailable, serving uncached");
                return self.passthrough(request).await;
            }
        };

        match self
            .pipeline
            .pre_handler::<CachedResponse>(&mut interception, &context)
            .await
        {
            Ok(Lookup::Hit(cached)) => {
                let mut response = cached.into_response();
                self.mark(&mut response, interception.status());
                return Ok(response);
            }
            Ok(Lookup::Miss) => {}
            Err(error) => {
                tracing::warn!(%error, route = context.route(), "cache lookup failed");
            }
        }

        let response = self.upstream.call(request).await?;
        let mut response = populate(&self.pipeline, &mut interception, &context, response).await;
        self.mark(&mut response, interception.status());
        Ok(response)
    }

    async fn passthrough<ReqBody, ResBody>(
        &mut self,
        request: Request<BufferedBody<ReqBody>>,
    ) -> Result<Response<BufferedBody<ResBody>>, S::Error>
    where
        S: Service<Request<BufferedBody<ReqBody>>, Response = Response<ResBody>>,
        ReqBody: HttpBody,
        ResBody: HttpBody,
    {
        let response = self.upstream.call(request).await?;
        Ok(response.map(BufferedBody::Passthrough))
    }

    fn mark<B>(&self, response: &mut Response<B>, status: CacheStatus) {
        set_cache_status(response.headers_mut(), &self.status_header, status);
    }
}

/// Hands the response to phase 3, buffering the body only when it may be stored.
async fn populate<ResBody>(
    pipeline: &CachePipeline<HttpRequestContext>,
    interception: &mut Interception,
    context: &HttpRequestContext,
    response: Response<ResBody>,
) -> Response<BufferedBody<ResBody>>
where
    ResBody: HttpBody,
{
    let (parts, body) = response.into_parts();
    if !parts.status.is_success() || interception.action().forbids_write() {
        tracing::debug!(status = %parts.status, action = ?interception.action(), "response not stored");
        return Response::from_parts(parts, BufferedBody::Passthrough(body));
    }

    let limit = pipeline.config().max_body_size;
    match BufferedBody::buffer_limited(body, limit).await {
        Collected::Complete(bytes) => {
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            if let Err(error) = pipeline
                .post_handler(interception, context, &cached)
                .await
            {
                tracing::warn!(%error, route = interception.route(), "response not cached");
            }
            Response::from_parts(parts, BufferedBody::Complete(Some(bytes)))
        }
        Collected::Failed(body) => {
            tracing::warn!(route = interception.route(), "response body could not be read, not cached");
            Response::from_parts(parts, body)
        }
        Collected::Oversized(body) => {
            tracing::debug!(route = interception.route(), ?limit, "response body over the size limit, not cached");
            Response::from_parts(parts, body)
        }
    }
}
