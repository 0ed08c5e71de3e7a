use thiserror::Error;

/// Errors raised while compiling a project's pipeline graph into a DAG
/// artifact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Loading the project graph failed.
    #[error("could not load project graph: {0}")]
    Store(#[from] scyflow_store::StoreError),

    /// The block-dependency graph contains a cycle.
    #[error("project graph is cyclic")]
    Cyclic,

    /// A block is not weakly connected to the rest of the project's graph.
    #[error("block '{0}' is disconnected from the rest of the project")]
    Disconnected(String),

    /// A referenced block's selected entrypoint could not be resolved.
    #[error("block '{0}' has no selected entrypoint")]
    MissingEntrypoint(String),

    /// Rendering one of the DAG's Python fragments failed.
    #[error("template rendering failed: {0}")]
    Render(#[from] tera::Error),

    /// Writing the compiled artifact to disk failed.
    #[error("writing DAG artifact failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        match self {
            CompileError::Store(e) => e.code(),
            CompileError::Cyclic => scyflow_core::ErrorCode::Cyclic,
            CompileError::Disconnected(_) => scyflow_core::ErrorCode::Disconnected,
            CompileError::MissingEntrypoint(_) => scyflow_core::ErrorCode::MissingConfig,
            CompileError::Render(_) | CompileError::Io(_) => scyflow_core::ErrorCode::UpstreamFailure,
        }
    }
}
