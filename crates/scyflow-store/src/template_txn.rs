//! Whole-template instantiation as a single transaction: every block, every
//! port, and every edge, or none of them (§4.E's "all-or-nothing" rule).

use std::collections::HashMap;

use scyflow_core::config::{propagate, validate_edge};
use scyflow_core::model::{Block, Direction, Entrypoint, Port, ScyflowUuid};
use uuid::Uuid;

use crate::error::StoreError;
use crate::ingestion::{NewBlock, NewEntrypoint};
use crate::rows::{block_from_row, config_to_json, data_type_as_str, direction_as_str, entrypoint_from_row, port_from_row};
use crate::Store;

/// One block to instantiate, keyed by its template-local name so edges can
/// reference it before any database id exists.
pub struct TemplateBlockSpec {
    /// The name used by `TemplateEdgeSpec` to reference this block.
    pub template_name: String,
    /// The block row to insert.
    pub new_block: NewBlock,
    /// Its entrypoints and their ports.
    pub entrypoints: Vec<NewEntrypoint>,
}

/// One edge to create after every block in the template has been inserted.
pub struct TemplateEdgeSpec {
    /// Template-local name of the upstream block.
    pub upstream_template_name: String,
    /// Output port name on the upstream block.
    pub upstream_output_name: String,
    /// Template-local name of the downstream block.
    pub downstream_template_name: String,
    /// Input port name on the downstream block.
    pub downstream_input_name: String,
}

/// The result of instantiating a template: every block created, keyed by
/// template-local name.
#[derive(serde::Serialize)]
pub struct InstantiatedTemplate {
    /// Persisted blocks, keyed by the template-local name used to create
    /// them.
    pub blocks: HashMap<String, Block>,
    /// Every entrypoint created.
    pub entrypoints: Vec<Entrypoint>,
    /// Every port created.
    pub ports: Vec<Port>,
}

impl Store {
    /// Inserts every block/entrypoint/port in `specs`, then every edge in
    /// `edges`, all in one transaction. A failure at any point — including
    /// an edge referencing a port no earlier spec declared — rolls
    /// everything back.
    pub async fn instantiate_template(
        &self,
        project_id: ScyflowUuid,
        specs: Vec<TemplateBlockSpec>,
        edges: Vec<TemplateEdgeSpec>,
    ) -> Result<InstantiatedTemplate, StoreError> {
        let mut client = self.pool.get().await?;
        let txn = client.transaction().await?;

        let mut blocks_by_name: HashMap<String, Block> = HashMap::new();
        let mut all_entrypoints = Vec::new();
        let mut all_ports = Vec::new();
        // (template_name, direction, port_name) -> port
        let mut ports_by_name: HashMap<(String, Direction, String), Port> = HashMap::new();

        for spec in specs {
            let block_id = Uuid::new_v4();
            let block_row = txn
                .query_one(
                    "INSERT INTO blocks
                        (id, project_id, name, custom_name, description, author,
                         docker_image, repo_url, x_pos, y_pos, retries, retry_delay_secs)
                     VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,0,300)
                     RETURNING *",
                    &[
                        &block_id,
                        &project_id,
                        &spec.new_block.name,
                        &spec.new_block.custom_name,
                        &spec.new_block.description,
                        &spec.new_block.author,
                        &spec.new_block.docker_image,
                        &spec.new_block.repo_url,
                        &spec.new_block.x_pos,
                        &spec.new_block.y_pos,
                    ],
                )
                .await?;

            let mut selected_entrypoint_id = None;
            for new_entry in spec.entrypoints {
                let entry_id = Uuid::new_v4();
                let envs_json = config_to_json(&new_entry.envs)?;
                let entry_row = txn
                    .query_one(
                        "INSERT INTO entrypoints (id, block_id, name, description, envs)
                         VALUES ($1,$2,$3,$4,$5) RETURNING *",
                        &[&entry_id, &block_id, &new_entry.name, &new_entry.description, &envs_json],
                    )
                    .await?;
                if new_entry.selected {
                    selected_entrypoint_id = Some(entry_id);
                }

                for new_port in new_entry.ports {
                    let port_id = Uuid::new_v4();
                    let config_json = config_to_json(&new_port.config)?;
                    let port_row = txn
                        .query_one(
                            "INSERT INTO ports
                                (id, entrypoint_id, direction, name, data_type, description, config)
                             VALUES ($1,$2,$3::port_direction,$4,$5::port_data_type,$6,$7)
                             RETURNING *",
                            &[
                                &port_id,
                                &entry_id,
                                &direction_as_str(new_port.direction),
                                &new_port.name,
                                &data_type_as_str(new_port.data_type),
                                &new_port.description,
                                &config_json,
                            ],
                        )
                        .await?;
                    let port = port_from_row(&port_row)?;
                    ports_by_name.insert(
                        (spec.template_name.clone(), port.direction, port.name.clone()),
                        port.clone(),
                    );
                    all_ports.push(port);
                }

                all_entrypoints.push(entrypoint_from_row(&entry_row)?);
            }

            if let Some(entry_id) = selected_entrypoint_id {
                txn.execute(
                    "UPDATE blocks SET selected_entrypoint_id = $1 WHERE id = $2",
                    &[&entry_id, &block_id],
                )
                .await?;
            }

            let final_row = if selected_entrypoint_id.is_some() {
                txn.query_one("SELECT * FROM blocks WHERE id = $1", &[&block_id])
                    .await?
            } else {
                block_row
            };
            blocks_by_name.insert(spec.template_name, block_from_row(&final_row)?);
        }

        for edge in edges {
            let source = ports_by_name
                .get(&(
                    edge.upstream_template_name.clone(),
                    Direction::Output,
                    edge.upstream_output_name.clone(),
                ))
                .ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "output '{}' on block '{}'",
                        edge.upstream_output_name, edge.upstream_template_name
                    ))
                })?
                .clone();
            let mut target = ports_by_name
                .get(&(
                    edge.downstream_template_name.clone(),
                    Direction::Input,
                    edge.downstream_input_name.clone(),
                ))
                .ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "input '{}' on block '{}'",
                        edge.downstream_input_name, edge.downstream_template_name
                    ))
                })?
                .clone();

            validate_edge(&source, &target)?;

            let upstream_block = &blocks_by_name[&edge.upstream_template_name];
            let downstream_block = &blocks_by_name[&edge.downstream_template_name];

            txn.execute(
                "INSERT INTO block_dependencies
                    (upstream_block_id, upstream_output_id, downstream_block_id, downstream_input_id)
                 VALUES ($1,$2,$3,$4)",
                &[&upstream_block.id, &source.id, &downstream_block.id, &target.id],
            )
            .await?;

            propagate(&source, &mut target);
            let config_json = config_to_json(&target.config)?;
            txn.execute(
                "UPDATE ports SET config = $1 WHERE id = $2",
                &[&config_json, &target.id],
            )
            .await?;

            if let Some(p) = all_ports.iter_mut().find(|p| p.id == target.id) {
                p.config = target.config.clone();
            }
        }

        txn.commit().await?;

        Ok(InstantiatedTemplate {
            blocks: blocks_by_name,
            entrypoints: all_entrypoints,
            ports: all_ports,
        })
    }
}
