//! Shared fixtures for pipeline tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use routecache::{Backend, CacheableResponse, Params, RequestContext};
use routecache_backend::{BackendError, BackendResult, DeleteStatus};
use routecache_core::{BackendLabel, CacheKey, CacheValue, Raw};
use serde::{Deserialize, Serialize};

/// DashMap-backed pool that counts reads and writes.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<CacheKey, CacheValue<Raw>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn has(&self, key: &CacheKey) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn ttl_of(&self, key: &CacheKey) -> Option<Duration> {
        self.store.get(key).and_then(|value| value.ttl())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get(key).map(|value| value.clone()))
    }

    async fn write(
        &self,
        key: &CacheKey,
        value: CacheValue<Raw>,
        _ttl: Option<Duration>,
    ) -> BackendResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("test")
    }
}

/// Pool whose reads fail and whose writes fail on demand.
#[derive(Clone, Default)]
pub struct FlakyBackend {
    pub fail_writes: bool,
}

fn simulated() -> BackendError {
    BackendError::ConnectionError(Box::new(std::io::Error::other("connection refused")))
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
        Err(simulated())
    }

    async fn write(
        &self,
        _key: &CacheKey,
        _value: CacheValue<Raw>,
        _ttl: Option<Duration>,
    ) -> BackendResult<()> {
        if self.fail_writes {
            Err(simulated())
        } else {
            Ok(())
        }
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(simulated())
    }
}

/// Minimal request.
#[derive(Clone, Default)]
pub struct TestRequest {
    pub route: Option<String>,
    pub handler: Option<String>,
    pub route_params: Params,
    pub query: Params,
    pub body: Params,
    pub control: Option<String>,
    pub sub_request: bool,
    pub user: Option<Params>,
}

impl TestRequest {
    pub fn get(route: &str, handler: &str) -> Self {
        TestRequest {
            route: Some(route.to_owned()),
            handler: Some(handler.to_owned()),
            ..Default::default()
        }
    }

    pub fn route_param(mut self, name: &str, value: &str) -> Self {
        self.route_params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, name: &str, value: &str) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    pub fn control(mut self, value: &str) -> Self {
        self.control = Some(value.to_owned());
        self
    }
}

impl RequestContext for TestRequest {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    fn route_params(&self) -> &Params {
        &self.route_params
    }

    fn query_params(&self) -> &Params {
        &self.query
    }

    fn body_params(&self) -> &Params {
        &self.body
    }

    fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("n-cache") {
            self.control.as_deref()
        } else {
            None
        }
    }

    fn is_main_request(&self) -> bool {
        !self.sub_request
    }
}

/// Minimal response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
}

impl TestResponse {
    pub fn ok(body: &str) -> Self {
        TestResponse {
            status: 200,
            body: body.to_owned(),
        }
    }
}

impl CacheableResponse for TestResponse {
    fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
