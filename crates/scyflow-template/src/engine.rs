//! Template Engine (§4.E): turns a parsed [`TemplateDocument`] into a
//! project's blocks, ports, and edges.

use std::collections::HashMap;

use scyflow_core::config::check_key_subset;
use scyflow_core::defaults::{FileDefaults, PgTableDefaults};
use scyflow_core::model::{ConfigMap, DataType, Direction, ScyflowUuid};
use scyflow_manifest::{BlockManifest, ManifestLoader};
use scyflow_store::{InstantiatedTemplate, NewBlock, NewEntrypoint, NewPort, Store, TemplateBlockSpec, TemplateEdgeSpec};

use crate::graph::layout;
use crate::schema::{TemplateBlock, TemplateDocument};
use crate::TemplateError;

/// Orchestrates manifest fetch, default-config assignment, and persistence
/// for whole-template instantiation.
pub struct TemplateEngine {
    loader: ManifestLoader,
    store: Store,
    file_defaults: FileDefaults,
    pg_defaults: PgTableDefaults,
}

impl TemplateEngine {
    /// Builds an engine against the given manifest loader, graph store, and
    /// process-wide default-config values.
    pub fn new(
        loader: ManifestLoader,
        store: Store,
        file_defaults: FileDefaults,
        pg_defaults: PgTableDefaults,
    ) -> Self {
        Self {
            loader,
            store,
            file_defaults,
            pg_defaults,
        }
    }

    /// Instantiates `doc` into `project_id`. All-or-nothing: a failure at
    /// any step leaves zero new blocks and zero new edges.
    pub async fn instantiate(
        &self,
        doc: &TemplateDocument,
        project_id: ScyflowUuid,
    ) -> Result<InstantiatedTemplate, TemplateError> {
        let manifests = self.fetch_manifests(&doc.blocks).await?;
        let layout_result = layout(&doc.blocks)?;

        let block_by_name: HashMap<&str, &TemplateBlock> =
            doc.blocks.iter().map(|b| (b.name.as_str(), b)).collect();

        let mut specs = Vec::with_capacity(doc.blocks.len());
        for name in &layout_result.order {
            let template_block = block_by_name[name.as_str()];
            let manifest = &manifests[&template_block.repo_url];
            specs.push(self.build_block_spec(
                template_block,
                manifest,
                layout_result.positions[name],
            )?);
        }

        let edges = doc
            .blocks
            .iter()
            .flat_map(|block| {
                block.inputs.iter().filter_map(move |input| {
                    input.depends_on.as_ref().map(|dep| TemplateEdgeSpec {
                        upstream_template_name: dep.block.clone(),
                        upstream_output_name: dep.output.clone(),
                        downstream_template_name: block.name.clone(),
                        downstream_input_name: input.identifier.clone(),
                    })
                })
            })
            .collect();

        self.store
            .instantiate_template(project_id, specs, edges)
            .await
            .map_err(TemplateError::from)
    }

    async fn fetch_manifests(
        &self,
        blocks: &[TemplateBlock],
    ) -> Result<HashMap<String, BlockManifest>, TemplateError> {
        let mut urls: Vec<&str> = blocks.iter().map(|b| b.repo_url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();

        let mut manifests = HashMap::with_capacity(urls.len());
        for url in urls {
            let manifest = self.loader.fetch(url).await?;
            manifests.insert(url.to_string(), manifest);
        }
        Ok(manifests)
    }

    fn build_block_spec(
        &self,
        template_block: &TemplateBlock,
        manifest: &BlockManifest,
        position: crate::graph::Position,
    ) -> Result<TemplateBlockSpec, TemplateError> {
        let entry_manifest = manifest.entrypoints.get(&template_block.entrypoint).ok_or_else(|| {
            TemplateError::Semantic(format!(
                "block '{}' selects entrypoint '{}', which the manifest does not declare",
                template_block.name, template_block.entrypoint
            ))
        })?;

        check_key_subset(&entry_manifest.envs, &template_block.envs)
            .map_err(|e| TemplateError::Semantic(e.to_string()))?;
        let mut envs = entry_manifest.envs.clone();
        envs.extend(template_block.envs.clone());

        let mut ports = Vec::new();
        for (port_name, port_manifest) in &entry_manifest.inputs {
            let overrides = template_block
                .inputs
                .iter()
                .find(|i| &i.identifier == port_name)
                .map(|i| i.settings.clone())
                .unwrap_or_default();
            check_key_subset(&port_manifest.config, &overrides)
                .map_err(|e| TemplateError::Semantic(e.to_string()))?;
            let mut config = port_manifest.config.clone();
            config.extend(overrides);
            ports.push(NewPort {
                direction: Direction::Input,
                name: port_name.clone(),
                data_type: port_manifest.data_type(),
                description: port_manifest.description.clone(),
                config,
            });
        }
        for (port_name, port_manifest) in &entry_manifest.outputs {
            let overrides = template_block
                .outputs
                .iter()
                .find(|o| &o.identifier == port_name)
                .map(|o| o.settings.clone())
                .unwrap_or_default();
            check_key_subset(&port_manifest.config, &overrides)
                .map_err(|e| TemplateError::Semantic(e.to_string()))?;
            let mut config = port_manifest.config.clone();
            self.apply_output_defaults(port_manifest.data_type(), port_name, &mut config);
            config.extend(overrides);
            ports.push(NewPort {
                direction: Direction::Output,
                name: port_name.clone(),
                data_type: port_manifest.data_type(),
                description: port_manifest.description.clone(),
                config,
            });
        }

        Ok(TemplateBlockSpec {
            template_name: template_block.name.clone(),
            new_block: NewBlock {
                name: manifest.name.clone(),
                custom_name: template_block.name.clone(),
                description: manifest.description.clone(),
                author: manifest.author.clone(),
                docker_image: manifest.docker_image.clone(),
                repo_url: template_block.repo_url.clone(),
                x_pos: position.x,
                y_pos: position.y,
            },
            entrypoints: vec![NewEntrypoint {
                name: template_block.entrypoint.clone(),
                description: entry_manifest.description.clone(),
                envs,
                ports,
                selected: true,
            }],
        })
    }

    fn apply_output_defaults(&self, data_type: DataType, io_name: &str, config: &mut ConfigMap) {
        let (defaults, keys) = match data_type {
            DataType::File => (self.file_defaults.build(io_name), scyflow_core::defaults::FILE_DEFAULT_KEYS),
            DataType::PgTable => (
                self.pg_defaults.build(io_name),
                scyflow_core::defaults::PGTABLE_DEFAULT_KEYS,
            ),
            DataType::Custom => return,
        };
        for (key, value) in config.iter_mut() {
            if let Some(dk) = keys.iter().find(|dk| key.contains(*dk)) {
                if let Some(v) = defaults.get(*dk) {
                    *value = v.clone();
                }
            }
        }
    }
}
