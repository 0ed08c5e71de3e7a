//! The user-visible error taxonomy (spec §7), shared by every crate in the
//! workspace so the API layer can map any domain error to one place.

use serde::{Deserialize, Serialize};

/// A stable, client-facing error code.
///
/// Every domain error produced anywhere in the workspace eventually carries
/// one of these. New variants may be added over time, so callers should not
/// exhaustively match without a wildcard arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    /// Entity lookup missed.
    NotFound,
    /// An edge was attempted between ports of incompatible `data_type`.
    TypeMismatch,
    /// A config update introduced keys absent from the existing map.
    ConfigKeysMismatch,
    /// The project or template graph contains a cycle.
    Cyclic,
    /// The project graph is not weakly connected.
    Disconnected,
    /// The manifest failed schema validation.
    ManifestInvalid,
    /// No manifest file was found at the expected path.
    ManifestNotFound,
    /// The manifest source repository could not be reached.
    RepoUnreachable,
    /// The workflow template failed schema validation.
    TemplateInvalid,
    /// The workflow template's dependency graph contains a cycle.
    TemplateCyclic,
    /// A run was launched with unset required configuration.
    MissingConfig,
    /// A run was launched against a project with zero blocks.
    EmptyProject,
    /// The orchestrator or object store returned an error.
    UpstreamFailure,
    /// The caller presented no credentials, or malformed ones.
    Unauthorized,
    /// The caller is not a member of the project being mutated.
    Forbidden,
    /// A uniqueness or foreign-key constraint was violated.
    Conflict,
    /// A not-null or check constraint was violated.
    Unprocessable,
}

impl ErrorCode {
    /// The conventional HTTP status for this code.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::NotFound | ErrorCode::ManifestNotFound => 404,
            ErrorCode::TypeMismatch
            | ErrorCode::ConfigKeysMismatch
            | ErrorCode::Cyclic
            | ErrorCode::Disconnected
            | ErrorCode::ManifestInvalid
            | ErrorCode::TemplateInvalid
            | ErrorCode::TemplateCyclic
            | ErrorCode::MissingConfig
            | ErrorCode::EmptyProject
            | ErrorCode::Unprocessable => 422,
            ErrorCode::RepoUnreachable | ErrorCode::UpstreamFailure => 502,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::Conflict => 409,
        }
    }
}
