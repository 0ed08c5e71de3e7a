use thiserror::Error;

/// Errors raised while locating or presigning access to a FILE-typed port's
/// backing object.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    /// Listing objects in the bucket failed.
    #[error("could not list objects: {0}")]
    List(String),

    /// No object under `FILE_PATH` contained the port's `FILE_NAME`.
    #[error("no object matching '{0}' found")]
    NotFound(String),

    /// Building or sending the presigning request failed.
    #[error("could not presign request: {0}")]
    Presign(String),
}

impl ArtifactError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        scyflow_core::ErrorCode::UpstreamFailure
    }
}
