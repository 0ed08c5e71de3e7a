use thiserror::Error;

/// Errors raised while talking to the workflow engine's REST API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    /// The HTTP request itself failed (connect, TLS, decode).
    #[error("orchestrator request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Exchanging credentials for a bearer token failed.
    #[error("orchestrator authentication failed: {0}")]
    Authentication(String),

    /// The engine returned a non-2xx response after a successful auth.
    #[error("orchestrator returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated if large.
        body: String,
    },

    /// A DAG failed to register within the bounded wait-poll timeout.
    #[error("dag '{0}' did not register within the timeout")]
    RegistrationTimeout(String),
}

impl OrchestratorError {
    /// Maps this error onto the shared client-facing taxonomy. Every
    /// variant here originates outside the process, so they all surface as
    /// `UPSTREAM_FAILURE` — the caller may retry.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        scyflow_core::ErrorCode::UpstreamFailure
    }
}
