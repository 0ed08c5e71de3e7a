//! Discovers workflow templates the same way compute blocks discover their
//! manifest: the templates repository is shallow-cloned and every
//! `*.yaml`/`*.yml` file at its root is a candidate template, identified by
//! file name.

use scyflow_manifest::ManifestLoader;
use tracing::warn;

use crate::schema::{self, TemplateDocument};
use crate::TemplateError;

/// Fetches every parseable template from `repo_url`. A file that fails to
/// parse is logged and skipped rather than failing the whole listing.
pub async fn list_templates(
    loader: &ManifestLoader,
    repo_url: &str,
) -> Result<Vec<TemplateDocument>, TemplateError> {
    let files = loader.list_yaml_files(repo_url).await?;
    let mut templates = Vec::with_capacity(files.len());
    for (name, contents) in files {
        match schema::parse(&contents, &name) {
            Ok(doc) => templates.push(doc),
            Err(e) => warn!(file = %name, error = %e, "skipping unparseable template file"),
        }
    }
    Ok(templates)
}

/// Fetches one template by its file identifier (e.g. `"etl-basic.yaml"`).
pub async fn get_template(
    loader: &ManifestLoader,
    repo_url: &str,
    identifier: &str,
) -> Result<TemplateDocument, TemplateError> {
    let files = loader.list_yaml_files(repo_url).await?;
    let (name, contents) = files
        .into_iter()
        .find(|(name, _)| name == identifier)
        .ok_or_else(|| TemplateError::Semantic(format!("no template file named '{identifier}'")))?;
    schema::parse(&contents, &name).map_err(|e| TemplateError::Invalid(name, e))
}
