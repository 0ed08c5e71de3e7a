use scyflow_core::config::{merge_checked, propagate};
use scyflow_core::model::{ConfigMap, ScyflowUuid};

use crate::error::StoreError;
use crate::rows::{config_to_json, port_from_row};
use crate::Store;

impl Store {
    /// Updates a port's config (key-subset rule enforced), then — if the
    /// port is an `OUTPUT` — cascades the new default-keyed values onto
    /// every directly downstream `INPUT`. No further recursion: downstream
    /// outputs are not re-derived.
    pub async fn update_port_config(
        &self,
        port_id: ScyflowUuid,
        update: ConfigMap,
    ) -> Result<(), StoreError> {
        let mut client = self.pool.get().await?;
        let txn = client.transaction().await?;

        let row = txn
            .query_one("SELECT * FROM ports WHERE id = $1 FOR UPDATE", &[&port_id])
            .await
            .map_err(|_| StoreError::NotFound(format!("port {port_id}")))?;
        let mut port = port_from_row(&row)?;

        merge_checked(&mut port.config, update)?;

        let config_json = config_to_json(&port.config)?;
        txn.execute(
            "UPDATE ports SET config = $1 WHERE id = $2",
            &[&config_json, &port_id],
        )
        .await?;

        let downstream_rows = txn
            .query(
                "SELECT p.* FROM ports p
                 JOIN block_dependencies bd ON bd.downstream_input_id = p.id
                 WHERE bd.upstream_output_id = $1
                 FOR UPDATE OF p",
                &[&port_id],
            )
            .await?;

        for downstream_row in downstream_rows {
            let mut downstream = port_from_row(&downstream_row)?;
            propagate(&port, &mut downstream);
            let downstream_json = config_to_json(&downstream.config)?;
            txn.execute(
                "UPDATE ports SET config = $1 WHERE id = $2",
                &[&downstream_json, &downstream.id],
            )
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Updates an entrypoint's env map (key-subset rule enforced). Envs
    /// never cascade across edges.
    pub async fn update_entrypoint_envs(
        &self,
        entrypoint_id: ScyflowUuid,
        update: ConfigMap,
    ) -> Result<(), StoreError> {
        let mut client = self.pool.get().await?;
        let txn = client.transaction().await?;

        let row = txn
            .query_one(
                "SELECT envs FROM entrypoints WHERE id = $1 FOR UPDATE",
                &[&entrypoint_id],
            )
            .await
            .map_err(|_| StoreError::NotFound(format!("entrypoint {entrypoint_id}")))?;
        let existing: serde_json::Value = row.try_get("envs")?;
        let mut envs: ConfigMap = serde_json::from_value(existing)
            .map_err(|e| StoreError::Conflict(format!("stored envs are not well-formed: {e}")))?;

        merge_checked(&mut envs, update)?;

        let envs_json = config_to_json(&envs)?;
        txn.execute(
            "UPDATE entrypoints SET envs = $1 WHERE id = $2",
            &[&envs_json, &entrypoint_id],
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }
}
