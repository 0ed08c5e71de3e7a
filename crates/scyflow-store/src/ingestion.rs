//! Atomic multi-row block creation, mirroring the "create block, flush,
//! bulk-create entrypoints, flush, bulk-create ports, commit" sequence the
//! ingestion path has always used — just as one SQL transaction instead of
//! three ORM flushes.

use scyflow_core::model::{Block, ConfigMap, DataType, Direction, Entrypoint, Port, ScyflowUuid};
use uuid::Uuid;

use crate::error::StoreError;
use crate::rows::{block_from_row, data_type_as_str, direction_as_str, entrypoint_from_row, port_from_row};
use crate::Store;

/// A block not yet persisted, with its manifest-declared identity.
#[derive(Debug, Clone)]
pub struct NewBlock {
    /// The name declared by the source manifest.
    pub name: String,
    /// The user-chosen display name.
    pub custom_name: String,
    /// Human description.
    pub description: Option<String>,
    /// Manifest author.
    pub author: Option<String>,
    /// Container image reference.
    pub docker_image: String,
    /// URL of the source manifest repository.
    pub repo_url: String,
    /// Canvas position.
    pub x_pos: f64,
    /// Canvas position.
    pub y_pos: f64,
}

/// An entrypoint not yet persisted, with its declared ports.
#[derive(Debug, Clone)]
pub struct NewEntrypoint {
    /// Entrypoint name.
    pub name: String,
    /// Human description.
    pub description: Option<String>,
    /// Environment map.
    pub envs: ConfigMap,
    /// Ports declared under this entrypoint.
    pub ports: Vec<NewPort>,
    /// Whether this is the block's selected entrypoint.
    pub selected: bool,
}

/// A port not yet persisted. Output ports are expected to already carry
/// default-config (§4.D's ingestion-time default assignment runs before
/// this struct is built, in the caller).
#[derive(Debug, Clone)]
pub struct NewPort {
    /// `INPUT` or `OUTPUT`.
    pub direction: Direction,
    /// Logical name.
    pub name: String,
    /// Storage kind.
    pub data_type: DataType,
    /// Human description.
    pub description: Option<String>,
    /// Declared/defaulted config.
    pub config: ConfigMap,
}

/// The persisted shape of a freshly-ingested block.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestedBlock {
    /// The block row.
    pub block: Block,
    /// Its entrypoints.
    pub entrypoints: Vec<Entrypoint>,
    /// Every port across every entrypoint.
    pub ports: Vec<Port>,
}

impl Store {
    /// Creates a block, its entrypoints, and their ports in one
    /// transaction. Any failure (including a second `selected = true`
    /// entrypoint) rolls the whole insert back.
    pub async fn ingest_block(
        &self,
        project_id: ScyflowUuid,
        new_block: NewBlock,
        new_entrypoints: Vec<NewEntrypoint>,
    ) -> Result<IngestedBlock, StoreError> {
        let mut client = self.pool.get().await?;
        let txn = client.transaction().await?;

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
                    &new_block.name,
                    &new_block.custom_name,
                    &new_block.description,
                    &new_block.author,
                    &new_block.docker_image,
                    &new_block.repo_url,
                    &new_block.x_pos,
                    &new_block.y_pos,
                ],
            )
            .await?;

        let mut entrypoints = Vec::with_capacity(new_entrypoints.len());
        let mut ports = Vec::new();
        let mut selected_entrypoint_id: Option<ScyflowUuid> = None;

        for new_entry in new_entrypoints {
            let entry_id = Uuid::new_v4();
            let envs_json = crate::rows::config_to_json(&new_entry.envs)?;
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
                let config_json = crate::rows::config_to_json(&new_port.config)?;
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
                ports.push(port_from_row(&port_row)?);
            }

            entrypoints.push(entrypoint_from_row(&entry_row)?);
        }

        if let Some(entry_id) = selected_entrypoint_id {
            txn.execute(
                "UPDATE blocks SET selected_entrypoint_id = $1 WHERE id = $2",
                &[&entry_id, &block_id],
            )
            .await?;
        }

        let block_row = if selected_entrypoint_id.is_some() {
            txn.query_one("SELECT * FROM blocks WHERE id = $1", &[&block_id])
                .await?
        } else {
            block_row
        };

        txn.commit().await?;

        Ok(IngestedBlock {
            block: block_from_row(&block_row)?,
            entrypoints,
            ports,
        })
    }
}
