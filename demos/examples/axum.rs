//! Axum Integration Example
//!
//! Demonstrates route-directed response caching with the Axum web framework.
//!
//! Features shown:
//! - Per-handler directives with different strategies and lifetimes
//! - `GET` keys from path and query parameters, restricted by an allow-list
//! - `POST` keys from a JSON body
//! - `USER` keys from the authenticated user stored by an auth middleware
//! - The `N-CACHE` control header (`invalidate`, `skip`)
//!
//! Run:
//!   cargo run -p routecache-demos --example axum
//!
//! Try it:
//!   curl -v http://localhost:3000/tasks?page=1              # MISS, then HIT
//!   curl -v http://localhost:3000/tasks?page=1&trace=abc    # still HIT: `trace` is not in the key
//!   curl -v http://localhost:3000/tasks/1                   # Task details
//!   curl -v -H 'N-CACHE: invalidate' http://localhost:3000/tasks/1   # refresh entry
//!   curl -v -H 'N-CACHE: skip' http://localhost:3000/tasks/1         # BYPASS
//!   curl -v -H 'x-user-id: 7' http://localhost:3000/me      # cached per user
//!   curl -v -d '{"q":"cache"}' -H 'content-type: application/json' http://localhost:3000/search

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use http::Method;
use routecache::{Backend, CacheDirective, CachePoolChain, DirectiveRegistry, Strategy};
use routecache_http::{ExtensionUser, Route, RouteTable};
use routecache_moka::MokaBackend;
use routecache_tower::Cache;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

// Domain Types

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct Search {
    pub q: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
}

fn all_tasks() -> Vec<Task> {
    [
        (1, "Set up project structure", true),
        (2, "Implement authentication", false),
        (3, "Write unit tests", false),
        (4, "Add caching layer", false),
    ]
    .into_iter()
    .map(|(id, title, done)| Task {
        id,
        title: title.into(),
        done,
    })
    .collect()
}

// Handlers

async fn list_tasks(Query(params): Query<ListParams>) -> Json<Vec<Task>> {
    tracing::info!(page = params.page, "listing tasks");
    Json(all_tasks().into_iter().skip(((params.page.max(1) - 1) * 2) as usize).take(2).collect())
}

async fn get_task(Path(id): Path<u32>) -> Result<Json<Task>, http::StatusCode> {
    tracing::info!(id, "fetching task");
    all_tasks()
        .into_iter()
        .find(|task| task.id == id)
        .map(Json)
        .ok_or(http::StatusCode::NOT_FOUND)
}

async fn search(Json(search): Json<Search>) -> Json<Vec<Task>> {
    tracing::info!(q = %search.q, "searching tasks");
    let needle = search.q.to_lowercase();
    Json(
        all_tasks()
            .into_iter()
            .filter(|task| task.title.to_lowercase().contains(&needle))
            .collect(),
    )
}

async fn profile(user: Option<Extension<User>>) -> String {
    match user {
        Some(Extension(user)) => format!("hello, user {}", user.id),
        None => "hello, stranger".to_string(),
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Stores the user named by `x-user-id` as a request extension.
async fn authenticate(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .map(|id| User { id });
    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

// Main

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,routecache=debug")),
        )
        .init();

    let memory: Arc<dyn Backend> = Arc::new(MokaBackend::builder().max_entries(10_000).build());
    let chain = CachePoolChain::activate(vec![memory]).await?;

    let routes = RouteTable::new()
        .route(Route::new("task_list", "/tasks", "TaskController::list").method(Method::GET))
        .route(Route::new("task_show", "/tasks/{id}", "TaskController::show").method(Method::GET))
        .route(Route::new("search", "/search", "SearchController::find").method(Method::POST))
        .route(Route::new("profile", "/me", "ProfileController::show").method(Method::GET))
        .route(Route::new("health", "/health", "HealthController::check"));

    let directives = DirectiveRegistry::new()
        .cached(
            "TaskController::list",
            CacheDirective::new(Strategy::Get)
                .expires(Duration::from_secs(60))
                .attribute("page"),
        )?
        .cached(
            "TaskController::show",
            CacheDirective::new(Strategy::Get).expires(Duration::from_secs(300)),
        )?
        .cached(
            "SearchController::find",
            CacheDirective::new(Strategy::Post).expires(Duration::from_secs(30)),
        )?
        .cached("ProfileController::show", CacheDirective::new(Strategy::User))?
        .uncached("HealthController::check")?;

    let cache = Cache::builder()
        .chain(chain)
        .routes(routes)
        .directives(directives)
        .user_provider(ExtensionUser::<User>::new())
        .build()?;

    let app = Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}", get(get_task))
        .route("/search", post(search))
        .route("/me", get(profile))
        .route("/health", get(health))
        .layer(cache)
        .layer(middleware::from_fn(authenticate));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
