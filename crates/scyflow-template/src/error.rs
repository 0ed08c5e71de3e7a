use thiserror::Error;

/// Errors raised while loading or instantiating a workflow template.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The template repository could not be cloned, or no file matched the
    /// requested identifier.
    #[error("template source error: {0}")]
    Source(#[from] scyflow_manifest::ManifestError),

    /// A template file did not parse as a [`crate::TemplateDocument`].
    #[error("template '{0}' is invalid: {1}")]
    Invalid(String, serde_yml::Error),

    /// A template block references an entrypoint, input, or output the
    /// manifest does not declare, or an envs/config override introduces a
    /// key the manifest didn't.
    #[error("template is invalid: {0}")]
    Semantic(String),

    /// The `depends_on` graph among template blocks contains a cycle.
    #[error("template dependency graph is cyclic")]
    Cyclic,

    /// Persisting the instantiated blocks/edges failed.
    #[error("could not persist template instantiation: {0}")]
    Store(#[from] scyflow_store::StoreError),
}

impl TemplateError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        match self {
            TemplateError::Source(e) => e.code(),
            TemplateError::Invalid(_, _) => scyflow_core::ErrorCode::TemplateInvalid,
            TemplateError::Semantic(_) => scyflow_core::ErrorCode::TemplateInvalid,
            TemplateError::Cyclic => scyflow_core::ErrorCode::TemplateCyclic,
            TemplateError::Store(e) => e.code(),
        }
    }
}
