//! Responses the pipeline can store and replay.

use serde::{Serialize, de::DeserializeOwned};

/// A handler response that can be written to a cache pool and served back
/// for a later request.
///
/// The pipeline only stores responses that report success.
pub trait CacheableResponse: Serialize + DeserializeOwned + Send + Sync {
    /// Returns `true` for a response worth caching (an HTTP 2xx, for
    /// example).
    fn is_successful(&self) -> bool;
}
