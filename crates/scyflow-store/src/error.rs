use thiserror::Error;

/// Errors raised by the graph store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No pool connection could be acquired.
    #[error("could not acquire a database connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The underlying driver reported an error (constraint violation,
    /// connection loss, malformed query, ...).
    #[error("database error: {0}")]
    Db(#[from] tokio_postgres::Error),

    /// A foreign-key or uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A domain-level rule (from `scyflow_core`) was violated mid-transaction.
    #[error(transparent)]
    Core(#[from] scyflow_core::CoreError),
}

impl StoreError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        match self {
            StoreError::NotFound(_) => scyflow_core::ErrorCode::NotFound,
            StoreError::Conflict(_) => scyflow_core::ErrorCode::Conflict,
            StoreError::Core(e) => e.code(),
            StoreError::Pool(_) | StoreError::Db(_) => scyflow_core::ErrorCode::UpstreamFailure,
        }
    }
}
