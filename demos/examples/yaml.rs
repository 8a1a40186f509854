//! YAML Configuration Example
//!
//! Builds the pool chain, route table and directives from a YAML document
//! and serves a small Axum application behind the cache layer.
//!
//! Run:
//!   cargo run -p routecache-demos --example yaml
//!
//! Try it:
//!   curl -v http://localhost:3000/articles/42          # MISS, then HIT
//!   curl -v -H 'N-CACHE: skip' http://localhost:3000/articles/42
//!   curl -v http://localhost:3000/stats                # never cached

use axum::{Router, extract::Path, routing::get};
use routecache_configuration::CacheSettings;
use routecache_tower::Cache;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
enabled: true
control_header: N-CACHE
value_format: Json
backends:
  - type: Moka
    max_capacity: 1000
routes:
  - name: article_show
    path: /articles/{id}
    methods: [GET]
    handler: ArticleController::show
    cache:
      strategy: GET
      expires: 2m
  - name: stats
    path: /stats
    methods: [GET]
    handler: StatsController::index
"#;

async fn article(Path(id): Path<u32>) -> String {
    tracing::info!(id, "rendering article");
    format!("article {id}")
}

async fn stats() -> &'static str {
    "requests: many"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,routecache=debug")),
        )
        .init();

    let built = CacheSettings::from_yaml(CONFIG)?.build().await?;
    let cache = Cache::builder()
        .chain(built.chain)
        .routes(built.routes)
        .directives(built.directives)
        .config(built.pipeline_config)
        .build()?;

    let app = Router::new()
        .route("/articles/{id}", get(article))
        .route("/stats", get(stats))
        .layer(cache);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
