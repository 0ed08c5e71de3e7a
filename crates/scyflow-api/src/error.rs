//! The single point where every domain error becomes an HTTP response.
//!
//! No handler in this crate hand-rolls a status code: each wraps a domain
//! crate's own error via `?`/`#[from]` into [`ApiError`], and the
//! [`IntoResponse`] impl here is the only place that consults
//! [`scyflow_core::ErrorCode::http_status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scyflow_core::ErrorCode;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result alias used throughout the server surface.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Per-block set of configuration keys still unset at run-launch time
/// (the structured `MISSING_CONFIG` payload).
#[derive(Debug, Clone, Serialize)]
pub struct UnsetBlockConfig {
    pub block_id: scyflow_core::ScyflowUuid,
    pub block_name: String,
    pub unset_keys: Vec<String>,
}

/// Everything that can go wrong while serving a request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] scyflow_store::StoreError),

    #[error(transparent)]
    Manifest(#[from] scyflow_manifest::ManifestError),

    #[error(transparent)]
    Template(#[from] scyflow_template::TemplateError),

    #[error(transparent)]
    Compile(#[from] scyflow_dag::CompileError),

    #[error(transparent)]
    Orchestrator(#[from] scyflow_orchestrator::OrchestratorError),

    #[error(transparent)]
    Artifact(#[from] scyflow_artifacts::ArtifactError),

    #[error(transparent)]
    Core(#[from] scyflow_core::CoreError),

    /// The caller presented no bearer claim at all.
    #[error("missing or malformed authorization")]
    Unauthenticated,

    /// The caller's claim names a principal that is not a project member.
    #[error("caller is not a member of this project")]
    NotMember,

    /// A run was launched while required configuration was still unset.
    #[error("configuration is incomplete")]
    MissingConfig(Vec<UnsetBlockConfig>),

    /// A run was launched against a project with no blocks.
    #[error("project has no blocks")]
    EmptyProject,

    /// Binding the listener or serving the accepted socket failed. Never
    /// surfaced to a caller — it can only occur around `axum::serve`, not
    /// inside a handler.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Store(e) => e.code(),
            ApiError::Manifest(e) => e.code(),
            ApiError::Template(e) => e.code(),
            ApiError::Compile(e) => e.code(),
            ApiError::Orchestrator(e) => e.code(),
            ApiError::Artifact(e) => e.code(),
            ApiError::Core(e) => e.code(),
            ApiError::Unauthenticated => ErrorCode::Unauthorized,
            ApiError::NotMember => ErrorCode::Forbidden,
            ApiError::MissingConfig(_) => ErrorCode::MissingConfig,
            ApiError::EmptyProject => ErrorCode::EmptyProject,
            ApiError::Io(_) => ErrorCode::UpstreamFailure,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &self {
            ApiError::MissingConfig(unset) => json!({
                "code": code,
                "message": self.to_string(),
                "unset": unset,
            }),
            _ => json!({
                "code": code,
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_maps_to_422() {
        let err = ApiError::MissingConfig(vec![]);
        assert_eq!(err.code().http_status(), 422);
    }

    #[test]
    fn unauthenticated_maps_to_401() {
        assert_eq!(ApiError::Unauthenticated.code().http_status(), 401);
    }

    #[test]
    fn not_member_maps_to_403() {
        assert_eq!(ApiError::NotMember.code().http_status(), 403);
    }
}
