use crate::codes::ErrorCode;
use thiserror::Error;

/// Errors raised by the data model and configuration engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An edge was attempted between ports of different `data_type`.
    #[error("port type mismatch: source is {source_type}, target is {target_type}")]
    TypeMismatch {
        /// Declared type of the upstream (source) port.
        source_type: String,
        /// Declared type of the downstream (target) port.
        target_type: String,
    },

    /// An edge was attempted with a source that is not an OUTPUT or a target
    /// that is not an INPUT.
    #[error("edge must run from an output to an input")]
    WrongDirection,

    /// A config update introduced a key not present in the prior map.
    #[error("config update introduces unknown keys: {0:?}")]
    ConfigKeysMismatch(Vec<String>),

    /// Two default keys of the same settings descriptor are substrings of
    /// one another, which would make substring-based matching ambiguous.
    #[error("default key '{0}' is a substring of default key '{1}' in the same settings descriptor")]
    AmbiguousDefaultKeys(String, String),

    /// A block's selected entrypoint does not belong to that block.
    #[error("entrypoint {entrypoint} does not belong to block {block}")]
    ForeignEntrypoint {
        /// The block the caller attempted to select the entrypoint for.
        block: String,
        /// The offending entrypoint id.
        entrypoint: String,
    },
}

impl CoreError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotFound(_) => ErrorCode::NotFound,
            CoreError::TypeMismatch { .. } | CoreError::WrongDirection => ErrorCode::TypeMismatch,
            CoreError::ConfigKeysMismatch(_) => ErrorCode::ConfigKeysMismatch,
            CoreError::AmbiguousDefaultKeys(_, _) => ErrorCode::Unprocessable,
            CoreError::ForeignEntrypoint { .. } => ErrorCode::Unprocessable,
        }
    }
}
