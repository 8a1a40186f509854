use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use http_body::Body as HttpBody;
use routecache::CacheStatus;
use routecache_core::CacheableResponse;
use serde::{Deserialize, Serialize};

use crate::body::BufferedBody;

/// Default header name for cache status (HIT/MISS/BYPASS).
pub const DEFAULT_CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// A handler response in the form it is stored in a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    /// Builds a stored response.
    ///
    /// The cache status header is dropped so a replayed response never
    /// carries the status of the request that stored it.
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let mut headers = headers.clone();
        headers.remove(DEFAULT_CACHE_STATUS_HEADER);
        CachedResponse {
            status,
            headers,
            body,
        }
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Header map.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Turns the stored response back into an HTTP response.
    pub fn into_response<B>(self) -> Response<BufferedBody<B>>
    where
        B: HttpBody,
    {
        let mut response = Response::new(BufferedBody::Complete(Some(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl CacheableResponse for CachedResponse {
    fn is_successful(&self) -> bool {
        self.status.is_success()
    }
}

/// Writes `status` into `headers` under `header`.
pub fn set_cache_status(headers: &mut HeaderMap, header: &HeaderName, status: CacheStatus) {
    headers.insert(header.clone(), HeaderValue::from_static(status.as_str()));
}
