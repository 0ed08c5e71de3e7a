use scyflow_core::model::{Block, Edge, Entrypoint, Port, ScyflowUuid};
use uuid::Uuid;

use crate::error::StoreError;
use crate::rows::{block_from_row, edge_from_row, entrypoint_from_row, port_from_row};
use crate::Store;

/// The whole pipeline graph of one project, eagerly joined.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    /// Every block in the project.
    pub blocks: Vec<Block>,
    /// Every entrypoint across every block.
    pub entrypoints: Vec<Entrypoint>,
    /// Every port across every entrypoint, ordered `data_type` (FILE <
    /// PGTABLE < CUSTOM) then name, matching the query view's intent.
    pub ports: Vec<Port>,
    /// Every edge with an endpoint in this project.
    pub edges: Vec<Edge>,
}

impl Store {
    /// Loads a project's full graph in four queries, ordered the way the
    /// workflow-configuration view (§4.I) expects to consume them.
    pub async fn fetch_project_graph(&self, project_id: ScyflowUuid) -> Result<ProjectGraph, StoreError> {
        let client = self.pool.get().await?;

        let block_rows = client
            .query("SELECT * FROM blocks WHERE project_id = $1", &[&project_id])
            .await?;
        let blocks: Vec<Block> = block_rows.iter().map(block_from_row).collect::<Result<_, _>>()?;
        let block_ids: Vec<Uuid> = blocks.iter().map(|b| b.id).collect();

        if block_ids.is_empty() {
            return Ok(ProjectGraph::default());
        }

        let entrypoint_rows = client
            .query(
                "SELECT * FROM entrypoints WHERE block_id = ANY($1)",
                &[&block_ids],
            )
            .await?;
        let entrypoints: Vec<Entrypoint> = entrypoint_rows
            .iter()
            .map(entrypoint_from_row)
            .collect::<Result<_, _>>()?;
        let entrypoint_ids: Vec<Uuid> = entrypoints.iter().map(|e| e.id).collect();

        let port_rows = client
            .query(
                "SELECT * FROM ports WHERE entrypoint_id = ANY($1)
                 ORDER BY data_type, name",
                &[&entrypoint_ids],
            )
            .await?;
        let ports: Vec<Port> = port_rows.iter().map(port_from_row).collect::<Result<_, _>>()?;

        let edge_rows = client
            .query(
                "SELECT * FROM block_dependencies
                 WHERE upstream_block_id = ANY($1) OR downstream_block_id = ANY($1)",
                &[&block_ids],
            )
            .await?;
        let edges: Vec<Edge> = edge_rows.iter().map(edge_from_row).collect::<Result<_, _>>()?;

        Ok(ProjectGraph {
            blocks,
            entrypoints,
            ports,
            edges,
        })
    }

    /// Deletes a single port by id. Used for unit/fixture tests; blocks are
    /// normally removed wholesale via [`Store::delete_block`].
    pub async fn get_port(&self, id: ScyflowUuid) -> Result<Port, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT * FROM ports WHERE id = $1", &[&id])
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("port {id}")))?;
        port_from_row(&row)
    }

    /// Deletes a block. `ON DELETE CASCADE` removes its entrypoints, ports,
    /// and every edge touching it (invariant 7).
    pub async fn delete_block(&self, id: ScyflowUuid) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let affected = client.execute("DELETE FROM blocks WHERE id = $1", &[&id]).await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("block {id}")));
        }
        Ok(())
    }
}
