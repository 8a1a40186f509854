//! Errors of the Redis pool.

use redis::RedisError;
use routecache_backend::BackendError;

/// Redis pool error.
///
/// Raised by [`RedisBackendBuilder::build`](crate::RedisBackendBuilder::build)
/// for an invalid URL and by pool operations when Redis is unreachable or
/// answers with an error. Converts into [`BackendError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the Redis client.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        match &error {
            Error::Redis(redis)
                if redis.is_io_error() || redis.is_timeout() =>
            {
                BackendError::ConnectionError(Box::new(error))
            }
            Error::Redis(_) => BackendError::InternalError(Box::new(error)),
        }
    }
}
