use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use pretty_assertions::assert_eq;
use routecache::{
    Backend, CacheDirective, CachePoolChain, ConfigurationError, DirectiveRegistry,
    PipelineConfig, Strategy,
};
use routecache_http::{BufferedBody, ExtensionUser, Route, RouteTable, SubRequest};
use routecache_moka::MokaBackend;
use routecache_tower::{Cache, DEFAULT_CACHE_STATUS_HEADER};
use serde::Serialize;
use tower::{Layer, Service, ServiceExt, service_fn};

type TestBody = BufferedBody<Full<Bytes>>;

#[derive(Clone, Serialize)]
struct User {
    id: u32,
}

fn chain() -> CachePoolChain {
    let memory: Arc<dyn Backend> = Arc::new(MokaBackend::builder().build());
    CachePoolChain::new(vec![memory]).unwrap()
}

fn routes() -> RouteTable {
    RouteTable::new()
        .route(Route::new("task_show", "/tasks/{id}", "TaskController::show").method(Method::GET))
        .route(Route::new("task_list", "/tasks", "TaskController::list").method(Method::GET))
        .route(Route::new("search", "/search", "SearchController::find").method(Method::POST))
        .route(Route::new("profile", "/me", "ProfileController::show").method(Method::GET))
}

fn directives() -> DirectiveRegistry {
    DirectiveRegistry::new()
        .cached(
            "TaskController::show",
            CacheDirective::new(Strategy::Get).expires(Duration::from_secs(60)),
        )
        .unwrap()
        .uncached("TaskController::list")
        .unwrap()
        .cached("SearchController::find", CacheDirective::new(Strategy::Post))
        .unwrap()
        .cached("ProfileController::show", CacheDirective::new(Strategy::User))
        .unwrap()
}

/// Upstream answering `call {n}: {path} {body}`; id `missing` yields a 404.
fn upstream(
    calls: Arc<AtomicUsize>,
) -> impl Service<
    Request<TestBody>,
    Response = Response<Full<Bytes>>,
    Error = Infallible,
    Future: Send + 'static,
> + Clone
+ Send
+ 'static {
    service_fn(move |request: Request<TestBody>| {
        let calls = Arc::clone(&calls);
        async move {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let status = if request.uri().path().ends_with("/missing") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::OK
            };
            let path = request.uri().path().to_owned();
            let body = request.into_body().collect().await?.to_bytes();
            let text = format!("call {call}: {path} {}", String::from_utf8_lossy(&body));
            Ok::<_, Infallible>(
                Response::builder()
                    .status(status)
                    .header("content-type", "text/plain")
                    .body(Full::new(Bytes::from(text)))
                    .unwrap(),
            )
        }
    })
}

fn harness(
    layer: Cache,
) -> (
    impl Service<Request<Full<Bytes>>, Response = Response<TestBody>, Error = Infallible> + Clone,
    Arc<AtomicUsize>,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    (layer.layer(upstream(Arc::clone(&calls))), calls)
}

fn default_layer() -> Cache {
    Cache::builder()
        .chain(chain())
        .routes(routes())
        .directives(directives())
        .user_provider(ExtensionUser::<User>::new())
        .build()
        .unwrap()
}

async fn send<S>(service: &S, request: Request<Full<Bytes>>) -> (Option<String>, StatusCode, String)
where
    S: Service<Request<Full<Bytes>>, Response = Response<TestBody>, Error = Infallible> + Clone,
{
    let response = service.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cache_status = response
        .headers()
        .get(DEFAULT_CACHE_STATUS_HEADER)
        .map(|value| value.to_str().unwrap().to_owned());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (cache_status, status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::get(uri).body(Full::default()).unwrap()
}

fn get_with_control(uri: &str, value: &str) -> Request<Full<Bytes>> {
    Request::get(uri)
        .header("N-CACHE", value)
        .body(Full::default())
        .unwrap()
}

fn post_json(uri: &str, json: &'static str) -> Request<Full<Bytes>> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(json.as_bytes())))
        .unwrap()
}

#[tokio::test]
async fn test_miss_then_hit() {
    let (service, calls) = harness(default_layer());

    let first = send(&service, get("/tasks/7")).await;
    assert_eq!(first, (Some("MISS".into()), StatusCode::OK, "call 1: /tasks/7 ".into()));

    let second = send(&service, get("/tasks/7")).await;
    assert_eq!(second, (Some("HIT".into()), StatusCode::OK, "call 1: /tasks/7 ".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hit_replays_headers() {
    let (service, _calls) = harness(default_layer());
    send(&service, get("/tasks/7")).await;

    let response = service.clone().oneshot(get("/tasks/7")).await.unwrap();
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.headers()[DEFAULT_CACHE_STATUS_HEADER], "HIT");
}

#[tokio::test]
async fn test_different_params_are_different_entries() {
    let (service, calls) = harness(default_layer());

    send(&service, get("/tasks/7?lang=en")).await;
    send(&service, get("/tasks/7?lang=fr")).await;
    send(&service, get("/tasks/8?lang=en")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let (status, _, body) = send(&service, get("/tasks/7?lang=fr")).await;
    assert_eq!(status.as_deref(), Some("HIT"));
    assert_eq!(body, "call 2: /tasks/7 ");
}

#[tokio::test]
async fn test_skip_bypasses_cache() {
    let (service, calls) = harness(default_layer());

    let (status, _, _) = send(&service, get_with_control("/tasks/7", "skip")).await;
    assert_eq!(status.as_deref(), Some("BYPASS"));

    let (status, _, body) = send(&service, get("/tasks/7")).await;
    assert_eq!(status.as_deref(), Some("MISS"));
    assert_eq!(body, "call 2: /tasks/7 ");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_skip_ignores_stored_entry() {
    let (service, calls) = harness(default_layer());
    send(&service, get("/tasks/7")).await;

    let (status, _, body) = send(&service, get_with_control("/tasks/7", "SKIP")).await;
    assert_eq!(status.as_deref(), Some("BYPASS"));
    assert_eq!(body, "call 2: /tasks/7 ");

    let (status, _, body) = send(&service, get("/tasks/7")).await;
    assert_eq!(status.as_deref(), Some("HIT"));
    assert_eq!(body, "call 1: /tasks/7 ");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_refreshes_entry() {
    let (service, calls) = harness(default_layer());
    send(&service, get("/tasks/7")).await;

    let (status, _, body) = send(&service, get_with_control("/tasks/7", "invalidate")).await;
    assert_eq!(status.as_deref(), Some("MISS"));
    assert_eq!(body, "call 2: /tasks/7 ");

    let (status, _, body) = send(&service, get("/tasks/7")).await;
    assert_eq!(status.as_deref(), Some("HIT"));
    assert_eq!(body, "call 2: /tasks/7 ");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unsuccessful_response_not_stored() {
    let (service, calls) = harness(default_layer());

    let first = send(&service, get("/tasks/missing")).await;
    let second = send(&service, get("/tasks/missing")).await;
    assert_eq!(first.0.as_deref(), Some("MISS"));
    assert_eq!(first.1, StatusCode::NOT_FOUND);
    assert_eq!(second.0.as_deref(), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_uncached_handler_passes_through() {
    let (service, calls) = harness(default_layer());

    let (status, _, _) = send(&service, get("/tasks")).await;
    assert_eq!(status, None);
    send(&service, get("/tasks")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unrouted_request_passes_through() {
    let (service, calls) = harness(default_layer());

    let (status, code, body) = send(&service, get("/unknown")).await;
    assert_eq!(status, None);
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, "call 1: /unknown ");
    send(&service, get("/unknown")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_post_strategy_keys_on_body_and_forwards_it() {
    let (service, calls) = harness(default_layer());

    let (status, _, body) = send(&service, post_json("/search", r#"{"q":"rust"}"#)).await;
    assert_eq!(status.as_deref(), Some("MISS"));
    assert_eq!(body, r#"call 1: /search {"q":"rust"}"#);

    let (status, _, _) = send(&service, post_json("/search", r#"{"q":"tower"}"#)).await;
    assert_eq!(status.as_deref(), Some("MISS"));

    let (status, _, body) = send(&service, post_json("/search", r#"{"q":"rust"}"#)).await;
    assert_eq!(status.as_deref(), Some("HIT"));
    assert_eq!(body, r#"call 1: /search {"q":"rust"}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_user_strategy_separates_users() {
    let (service, calls) = harness(default_layer());

    let as_user = |id: u32| {
        let mut request = get("/me");
        request.extensions_mut().insert(User { id });
        request
    };

    send(&service, as_user(1)).await;
    send(&service, as_user(2)).await;
    let (status, _, body) = send(&service, as_user(1)).await;
    assert_eq!(status.as_deref(), Some("HIT"));
    assert_eq!(body, "call 1: /me ");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sub_request_not_cached() {
    let (service, calls) = harness(default_layer());

    for _ in 0..2 {
        let mut request = get("/tasks/7");
        request.extensions_mut().insert(SubRequest);
        let (status, _, _) = send(&service, request).await;
        assert_eq!(status, None);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_disabled_pipeline_passes_through() {
    let layer = Cache::builder()
        .chain(chain())
        .routes(routes())
        .directives(directives())
        .config(PipelineConfig::disabled())
        .build()
        .unwrap();
    let (service, calls) = harness(layer);

    let (status, _, _) = send(&service, get("/tasks/7")).await;
    assert_eq!(status, None);
    send(&service, get("/tasks/7")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_custom_control_header() {
    let layer = Cache::builder()
        .chain(chain())
        .routes(routes())
        .directives(directives())
        .config(PipelineConfig::default().control_header("X-Cache-Control"))
        .build()
        .unwrap();
    let (service, calls) = harness(layer);

    let request = Request::get("/tasks/7")
        .header("X-Cache-Control", "skip")
        .body(Full::default())
        .unwrap();
    let (status, _, _) = send(&service, request).await;
    assert_eq!(status.as_deref(), Some("BYPASS"));

    // The default header name has no effect any more.
    let (status, _, _) = send(&service, get_with_control("/tasks/7", "skip")).await;
    assert_eq!(status.as_deref(), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

fn limited_layer(limit: usize) -> Cache {
    Cache::builder()
        .chain(chain())
        .routes(routes())
        .directives(directives())
        .config(PipelineConfig::default().max_body_size(Some(limit)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_oversized_request_body_served_uncached() {
    let (service, calls) = harness(limited_layer(8));

    for call in 1..=2 {
        let (status, _, body) = send(&service, post_json("/search", r#"{"q":"a long query"}"#)).await;
        assert_eq!(status, None);
        assert_eq!(body, format!(r#"call {call}: /search {{"q":"a long query"}}"#));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_oversized_response_not_stored() {
    let (service, calls) = harness(limited_layer(10));

    let first = send(&service, get("/tasks/7")).await;
    assert_eq!(first, (Some("MISS".into()), StatusCode::OK, "call 1: /tasks/7 ".into()));

    let second = send(&service, get("/tasks/7")).await;
    assert_eq!(second, (Some("MISS".into()), StatusCode::OK, "call 2: /tasks/7 ".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_build_requires_chain() {
    let result = Cache::builder().routes(routes()).build();
    assert!(matches!(result, Err(ConfigurationError::EmptyChain)));
}
