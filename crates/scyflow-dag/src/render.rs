//! Renders a compiled graph into the three Python fragments that make up
//! one DAG artifact, using embedded Tera templates.

use std::collections::BTreeMap;

use scyflow_core::model::{ConfigMap, Port};
use scyflow_store::ProjectGraph;
use serde_json::json;
use tera::{Context, Tera};

use crate::error::CompileError;
use crate::ids::{block_id_to_task_id, project_id_to_dag_id};

const DAG_HEADER_TEMPLATE: &str = include_str!("../templates/dag_header.py.j2");
const TASK_NODE_TEMPLATE: &str = include_str!("../templates/task_node.py.j2");
const DEPENDENCY_TEMPLATE: &str = include_str!("../templates/dependency.py.j2");

/// Process-wide defaults the DAG compiler bakes into every rendered task,
/// populated once at startup.
#[derive(Debug, Clone)]
pub struct DagRenderConfig {
    /// Docker network every task container joins.
    pub network_mode: String,
    /// Host path mounted into every task container at `/data`.
    pub local_storage_path_external: String,
}

fn tera() -> Result<Tera, CompileError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("dag_header.py.j2", DAG_HEADER_TEMPLATE),
        ("task_node.py.j2", TASK_NODE_TEMPLATE),
        ("dependency.py.j2", DEPENDENCY_TEMPLATE),
    ])?;
    Ok(tera)
}

/// Merges an entrypoint's envs with every port's config into one flattened,
/// all-string environment map, as §4.F's node-payload step requires.
fn flatten_environment(envs: &ConfigMap, ports: &[&Port]) -> BTreeMap<String, String> {
    let mut flattened: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in envs {
        flattened.insert(key.clone(), value.to_env_string());
    }
    for port in ports {
        for (key, value) in &port.config {
            flattened.insert(key.clone(), value.to_env_string());
        }
    }
    flattened
}

/// Renders one block's task-node fragment.
pub fn render_task_node(
    tera: &Tera,
    project_id: uuid::Uuid,
    block: &scyflow_core::model::Block,
    entry_name: &str,
    envs: &ConfigMap,
    ports: &[&Port],
    config: &DagRenderConfig,
) -> Result<String, CompileError> {
    let environment = flatten_environment(envs, ports);
    let mut ctx = Context::new();
    ctx.insert("task_id", &block_id_to_task_id(block.id));
    ctx.insert("image", &block.docker_image);
    ctx.insert("name", &block.custom_name);
    ctx.insert("uuid", &block.id.to_string());
    ctx.insert("project", &project_id.to_string());
    ctx.insert("entry_name", entry_name);
    ctx.insert("environment", &json!(environment).to_string());
    ctx.insert("local_storage_path_external", &config.local_storage_path_external);
    ctx.insert("network_mode", &config.network_mode);
    ctx.insert(
        "priority_weight",
        &block.scheduling.priority_weight.unwrap_or(1),
    );
    ctx.insert("retries", &block.scheduling.retries);
    ctx.insert("retry_delay", &block.scheduling.retry_delay_secs);
    Ok(tera.render("task_node.py.j2", &ctx)?)
}

/// Renders the DAG header fragment.
pub fn render_header(
    tera: &Tera,
    project_id: uuid::Uuid,
    default_retries: i32,
    default_retry_delay_secs: i32,
) -> Result<String, CompileError> {
    let mut ctx = Context::new();
    ctx.insert("dag_id", &project_id_to_dag_id(project_id));
    ctx.insert("default_retries", &default_retries);
    ctx.insert("default_retry_delay", &default_retry_delay_secs);
    Ok(tera.render("dag_header.py.j2", &ctx)?)
}

/// Renders one edge's dependency fragment.
pub fn render_dependency(
    tera: &Tera,
    upstream_block_id: uuid::Uuid,
    downstream_block_id: uuid::Uuid,
) -> Result<String, CompileError> {
    let mut ctx = Context::new();
    ctx.insert("from_task", &block_id_to_task_id(upstream_block_id));
    ctx.insert("to_task", &block_id_to_task_id(downstream_block_id));
    Ok(tera.render("dependency.py.j2", &ctx)?)
}

/// Renders the whole artifact: header, then one task node per block in
/// `order`, then one dependency line per edge.
pub fn render_artifact(
    project: &ProjectGraph,
    project_id: uuid::Uuid,
    order: &[uuid::Uuid],
    default_retries: i32,
    default_retry_delay_secs: i32,
    config: &DagRenderConfig,
) -> Result<String, CompileError> {
    let tera = tera()?;

    let mut fragments = vec![render_header(
        &tera,
        project_id,
        default_retries,
        default_retry_delay_secs,
    )?];

    for &block_id in order {
        let block = project
            .blocks
            .iter()
            .find(|b| b.id == block_id)
            .expect("order only contains block ids present in the project graph");
        let entrypoint_id = block
            .selected_entrypoint_id
            .ok_or_else(|| CompileError::MissingEntrypoint(block.custom_name.clone()))?;
        let entrypoint = project
            .entrypoints
            .iter()
            .find(|e| e.id == entrypoint_id)
            .ok_or_else(|| CompileError::MissingEntrypoint(block.custom_name.clone()))?;
        let ports: Vec<&Port> = project
            .ports
            .iter()
            .filter(|p| p.entrypoint_id == entrypoint_id)
            .collect();

        fragments.push(render_task_node(
            &tera,
            project_id,
            block,
            &entrypoint.name,
            &entrypoint.envs,
            &ports,
            config,
        )?);
    }

    for edge in &project.edges {
        fragments.push(render_dependency(
            &tera,
            edge.upstream_block_id,
            edge.downstream_block_id,
        )?);
    }

    Ok(fragments.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scyflow_core::model::ConfigValue;

    #[test]
    fn port_config_overrides_entrypoint_envs_on_key_collision() {
        let mut envs = ConfigMap::new();
        envs.insert("SHARED".into(), ConfigValue::String("from_envs".into()));
        envs.insert("ONLY_ENV".into(), ConfigValue::String("env_value".into()));

        let mut port_config = ConfigMap::new();
        port_config.insert("SHARED".into(), ConfigValue::String("from_port".into()));
        let port = scyflow_core::model::Port {
            id: uuid::Uuid::new_v4(),
            entrypoint_id: uuid::Uuid::new_v4(),
            direction: scyflow_core::model::Direction::Output,
            name: "out".into(),
            data_type: scyflow_core::model::DataType::Custom,
            description: None,
            config: port_config,
        };

        let flattened = flatten_environment(&envs, &[&port]);
        assert_eq!(flattened.get("SHARED").unwrap(), "from_port");
        assert_eq!(flattened.get("ONLY_ENV").unwrap(), "env_value");
    }

    #[test]
    fn dependency_fragment_renders_task_ids() {
        let tera = tera().unwrap();
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let rendered = render_dependency(&tera, a, b).unwrap();
        assert!(rendered.contains(&block_id_to_task_id(a)));
        assert!(rendered.contains(&block_id_to_task_id(b)));
        assert!(rendered.contains(">>"));
    }
}
