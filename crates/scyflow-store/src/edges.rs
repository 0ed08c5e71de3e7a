use scyflow_core::config::{propagate, validate_edge};
use scyflow_core::model::{Edge, ScyflowUuid};

use crate::error::StoreError;
use crate::rows::{config_to_json, port_from_row};
use crate::Store;

impl Store {
    /// Creates an edge from `source_output_id` to `target_input_id`,
    /// validating direction/type compatibility (invariants 1 and 3) and
    /// cascading default-config propagation onto the target, all in one
    /// transaction.
    pub async fn create_edge(
        &self,
        source_output_id: ScyflowUuid,
        target_input_id: ScyflowUuid,
    ) -> Result<Edge, StoreError> {
        let mut client = self.pool.get().await?;
        let txn = client.transaction().await?;

        let source_row = txn
            .query_one("SELECT * FROM ports WHERE id = $1 FOR UPDATE", &[&source_output_id])
            .await
            .map_err(|_| StoreError::NotFound(format!("port {source_output_id}")))?;
        let target_row = txn
            .query_one("SELECT * FROM ports WHERE id = $1 FOR UPDATE", &[&target_input_id])
            .await
            .map_err(|_| StoreError::NotFound(format!("port {target_input_id}")))?;

        let source = port_from_row(&source_row)?;
        let mut target = port_from_row(&target_row)?;

        validate_edge(&source, &target)?;

        let upstream_block_id: uuid::Uuid = {
            let row = txn
                .query_one(
                    "SELECT block_id FROM entrypoints WHERE id = $1",
                    &[&source.entrypoint_id],
                )
                .await?;
            row.try_get("block_id")?
        };
        let downstream_block_id: uuid::Uuid = {
            let row = txn
                .query_one(
                    "SELECT block_id FROM entrypoints WHERE id = $1",
                    &[&target.entrypoint_id],
                )
                .await?;
            row.try_get("block_id")?
        };

        txn.execute(
            "INSERT INTO block_dependencies
                (upstream_block_id, upstream_output_id, downstream_block_id, downstream_input_id)
             VALUES ($1,$2,$3,$4)",
            &[&upstream_block_id, &source.id, &downstream_block_id, &target.id],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
                StoreError::Conflict(format!("edge {source_output_id} -> {target_input_id} already exists"))
            } else {
                StoreError::Db(e)
            }
        })?;

        propagate(&source, &mut target);
        let config_json = config_to_json(&target.config)?;
        txn.execute(
            "UPDATE ports SET config = $1 WHERE id = $2",
            &[&config_json, &target.id],
        )
        .await?;

        txn.commit().await?;

        Ok(Edge {
            upstream_block_id,
            upstream_output_id: source.id,
            downstream_block_id,
            downstream_input_id: target.id,
        })
    }

    /// Removes an edge. Downstream config is left exactly as it is — edge
    /// deletion never un-propagates a value (design note in §9).
    pub async fn delete_edge(
        &self,
        source_output_id: ScyflowUuid,
        target_input_id: ScyflowUuid,
    ) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let affected = client
            .execute(
                "DELETE FROM block_dependencies
                 WHERE upstream_output_id = $1 AND downstream_input_id = $2",
                &[&source_output_id, &target_input_id],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!(
                "edge {source_output_id} -> {target_input_id}"
            )));
        }
        Ok(())
    }
}
