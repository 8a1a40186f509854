use std::path::PathBuf;

use bincode::error::{DecodeError, EncodeError};
use routecache_backend::{BackendError, FormatError};

/// File pool error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure on the pool directory or an entry file.
    #[error("file backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured path exists but is not a directory.
    #[error("cache path `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The key cannot be used as a file name.
    #[error("cache key `{0}` is not a valid file name")]
    InvalidKey(String),

    /// An entry could not be encoded.
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] EncodeError),

    /// An entry file is corrupt.
    #[error("failed to decode cache entry: {0}")]
    Decode(#[from] DecodeError),
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        match error {
            Error::Encode(error) => FormatError::Serialize(Box::new(error)).into(),
            Error::Decode(error) => FormatError::Deserialize(Box::new(error)).into(),
            error => BackendError::InternalError(Box::new(error)),
        }
    }
}
