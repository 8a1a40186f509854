use routecache_backend::BackendError;

/// SQL pool error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the database driver.
    #[error("SQL backend error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The table name is not a plain identifier.
    #[error("invalid cache table name `{0}`")]
    InvalidTableName(String),

    /// The table is still missing after provisioning.
    #[error("cache table `{0}` does not exist and could not be created")]
    TableMissing(String),
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        match error {
            Error::Sqlx(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed,
            ) => BackendError::ConnectionError(Box::new(error)),
            error => BackendError::InternalError(Box::new(error)),
        }
    }
}
