//! Row <-> domain type mapping. Kept in one place so every query builds
//! entities the same way.

use scyflow_core::model::{
    Block, ConfigMap, DataType, Direction, Edge, Entrypoint, Port, Project, SchedulingHints,
};
use tokio_postgres::Row;

use crate::error::StoreError;

fn config_from_json(value: serde_json::Value) -> Result<ConfigMap, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Conflict(format!("stored config is not well-formed: {e}")))
}

pub(crate) fn project_from_row(row: &Row) -> Result<Project, StoreError> {
    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        users: row.try_get("users")?,
        default_retries: row.try_get("default_retries")?,
    })
}

pub(crate) fn block_from_row(row: &Row) -> Result<Block, StoreError> {
    Ok(Block {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        name: row.try_get("name")?,
        custom_name: row.try_get("custom_name")?,
        description: row.try_get("description")?,
        author: row.try_get("author")?,
        docker_image: row.try_get("docker_image")?,
        repo_url: row.try_get("repo_url")?,
        x_pos: row.try_get("x_pos")?,
        y_pos: row.try_get("y_pos")?,
        selected_entrypoint_id: row.try_get("selected_entrypoint_id")?,
        scheduling: SchedulingHints {
            priority_weight: row.try_get("priority_weight")?,
            retries: row.try_get("retries")?,
            retry_delay_secs: row.try_get("retry_delay_secs")?,
        },
    })
}

pub(crate) fn entrypoint_from_row(row: &Row) -> Result<Entrypoint, StoreError> {
    Ok(Entrypoint {
        id: row.try_get("id")?,
        block_id: row.try_get("block_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        envs: config_from_json(row.try_get("envs")?)?,
    })
}

fn data_type_from_str(s: &str) -> DataType {
    match s {
        "file" => DataType::File,
        "db_table" => DataType::PgTable,
        _ => DataType::Custom,
    }
}

pub(crate) fn data_type_as_str(dt: DataType) -> &'static str {
    match dt {
        DataType::File => "file",
        DataType::PgTable => "db_table",
        DataType::Custom => "custom",
    }
}

pub(crate) fn direction_as_str(d: Direction) -> &'static str {
    match d {
        Direction::Input => "INPUT",
        Direction::Output => "OUTPUT",
    }
}

pub(crate) fn port_from_row(row: &Row) -> Result<Port, StoreError> {
    let direction: String = row.try_get("direction")?;
    let data_type: String = row.try_get("data_type")?;
    Ok(Port {
        id: row.try_get("id")?,
        entrypoint_id: row.try_get("entrypoint_id")?,
        direction: if direction == "OUTPUT" {
            Direction::Output
        } else {
            Direction::Input
        },
        name: row.try_get("name")?,
        data_type: data_type_from_str(&data_type),
        description: row.try_get("description")?,
        config: config_from_json(row.try_get("config")?)?,
    })
}

pub(crate) fn edge_from_row(row: &Row) -> Result<Edge, StoreError> {
    Ok(Edge {
        upstream_block_id: row.try_get("upstream_block_id")?,
        upstream_output_id: row.try_get("upstream_output_id")?,
        downstream_block_id: row.try_get("downstream_block_id")?,
        downstream_input_id: row.try_get("downstream_input_id")?,
    })
}

pub(crate) fn config_to_json(config: &ConfigMap) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(config)
        .map_err(|e| StoreError::Conflict(format!("config is not serializable: {e}")))
}
