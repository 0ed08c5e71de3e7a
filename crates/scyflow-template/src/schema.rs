//! The wire shape of a workflow template document.

use scyflow_core::model::ConfigMap;
use serde::Deserialize;

/// A parsed workflow template.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
    /// The pipeline this template describes.
    pub pipeline: PipelineHeader,
    /// Blocks to instantiate.
    pub blocks: Vec<TemplateBlock>,
    /// Populated by the loader from the source file name, not the document
    /// body — mirrors treating the file name itself as the identifier.
    #[serde(skip)]
    pub file_identifier: String,
}

/// Pipeline-level metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineHeader {
    /// Display name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form tags for discovery/filtering.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One block to instantiate from a template.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateBlock {
    /// The template-local name used by `depends_on` references. Also used
    /// as the block's `custom_name` unless the caller renames it.
    pub name: String,
    /// Source manifest repository.
    pub repo_url: String,
    /// Entrypoint to select.
    pub entrypoint: String,
    /// Envs overrides; keys must be a subset of the manifest's.
    #[serde(default)]
    pub envs: ConfigMap,
    /// Input overrides/wiring.
    #[serde(default)]
    pub inputs: Vec<TemplateInput>,
    /// Output overrides.
    #[serde(default)]
    pub outputs: Vec<TemplateOutput>,
}

/// An input port reference within a template block.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    /// The manifest-declared input name.
    pub identifier: String,
    /// Config overrides; keys must be a subset of the manifest's.
    #[serde(default)]
    pub settings: ConfigMap,
    /// If set, this input is wired to another template block's output.
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
}

/// An output port reference within a template block.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateOutput {
    /// The manifest-declared output name.
    pub identifier: String,
    /// Config overrides; keys must be a subset of the manifest's.
    #[serde(default)]
    pub settings: ConfigMap,
}

/// A template-local edge reference.
#[derive(Debug, Clone, Deserialize)]
pub struct DependsOn {
    /// The upstream block's template-local name.
    pub block: String,
    /// The upstream output's identifier.
    pub output: String,
}

pub(crate) fn parse(raw: &str, file_identifier: &str) -> Result<TemplateDocument, serde_yml::Error> {
    let mut doc: TemplateDocument = serde_yml::from_str(raw)?;
    doc.file_identifier = file_identifier.to_string();
    Ok(doc)
}
