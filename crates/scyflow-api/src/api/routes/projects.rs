//! Project-scoped REST surface (§4.I): CRUD over the pipeline graph,
//! template discovery/instantiation, the four-bucket workflow-configuration
//! view, and run launch.

use std::collections::{BTreeMap, HashSet};

use axum::extract::{Extension, Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use scyflow_core::model::{Block, ConfigMap, ConfigValue, DataType, Direction, Port, ScyflowUuid};
use serde::{Deserialize, Serialize};

use crate::api::middleware::Principal;
use crate::api::AppState;
use crate::error::{ApiError, Result, UnsetBlockConfig};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:project_id", get(get_project).delete(delete_project))
        .route("/projects/:project_id/blocks", post(create_block))
        .route("/projects/:project_id/blocks/:block_id", delete(delete_block))
        .route("/projects/:project_id/edges", post(create_edge).delete(delete_edge))
        .route("/projects/:project_id/ports/:port_id/config", put(update_port_config))
        .route(
            "/projects/:project_id/entrypoints/:entrypoint_id/envs",
            put(update_entrypoint_envs),
        )
        .route("/projects/:project_id/templates", get(list_templates).post(instantiate_template))
        .route("/projects/:project_id/config", get(get_workflow_config))
        .route("/projects/:project_id/runs", post(launch_run))
}

async fn require_member(state: &AppState, project_id: ScyflowUuid, principal: &Principal) -> Result<()> {
    if state.store.is_member(project_id, principal.0).await? {
        Ok(())
    } else {
        Err(ApiError::NotMember)
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Deserialize)]
struct CreateProjectRequest {
    name: String,
    #[serde(default)]
    users: Vec<ScyflowUuid>,
    #[serde(default)]
    default_retries: i32,
}

async fn create_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<scyflow_core::model::Project>> {
    let mut users = req.users;
    if !users.contains(&principal.0) {
        users.push(principal.0);
    }
    let project = state.store.create_project(&req.name, &users, req.default_retries).await?;
    Ok(Json(project))
}

async fn list_projects(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<scyflow_core::model::Project>>> {
    let projects = state.store.list_projects_for_user(principal.0).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
) -> Result<Json<scyflow_core::model::Project>> {
    require_member(&state, project_id, &principal).await?;
    let project = state.store.get_project(project_id).await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
) -> Result<()> {
    require_member(&state, project_id, &principal).await?;
    state.store.delete_project(project_id).await?;
    Ok(())
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Deserialize)]
struct CreateBlockRequest {
    repo_url: String,
    entrypoint: String,
    custom_name: String,
    x_pos: f64,
    y_pos: f64,
    #[serde(default)]
    envs: ConfigMap,
    #[serde(default)]
    input_overrides: BTreeMap<String, ConfigMap>,
    #[serde(default)]
    output_overrides: BTreeMap<String, ConfigMap>,
}

/// Fetches the block's manifest, resolves the chosen entrypoint, applies
/// envs/port overrides under the key-subset rule, assigns output defaults,
/// and persists — the single-block counterpart of the template engine's
/// whole-template build step.
async fn create_block(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
    Json(req): Json<CreateBlockRequest>,
) -> Result<Json<scyflow_store::IngestedBlock>> {
    require_member(&state, project_id, &principal).await?;

    let manifest = state.manifest_loader.fetch(&req.repo_url).await?;
    let entry_manifest = manifest.entrypoints.get(&req.entrypoint).ok_or_else(|| {
        scyflow_core::CoreError::NotFound(format!(
            "entrypoint '{}' in manifest at {}",
            req.entrypoint, req.repo_url
        ))
    })?;

    scyflow_core::config::check_key_subset(&entry_manifest.envs, &req.envs)?;
    let mut envs = entry_manifest.envs.clone();
    envs.extend(req.envs);

    let mut ports = Vec::new();
    for (name, port_manifest) in &entry_manifest.inputs {
        let overrides = req.input_overrides.get(name).cloned().unwrap_or_default();
        scyflow_core::config::check_key_subset(&port_manifest.config, &overrides)?;
        let mut config = port_manifest.config.clone();
        config.extend(overrides);
        ports.push(scyflow_store::NewPort {
            direction: Direction::Input,
            name: name.clone(),
            data_type: port_manifest.data_type(),
            description: port_manifest.description.clone(),
            config,
        });
    }
    for (name, port_manifest) in &entry_manifest.outputs {
        let overrides = req.output_overrides.get(name).cloned().unwrap_or_default();
        scyflow_core::config::check_key_subset(&port_manifest.config, &overrides)?;
        let mut config = port_manifest.config.clone();
        apply_output_defaults(&state, port_manifest.data_type(), name, &mut config);
        config.extend(overrides);
        ports.push(scyflow_store::NewPort {
            direction: Direction::Output,
            name: name.clone(),
            data_type: port_manifest.data_type(),
            description: port_manifest.description.clone(),
            config,
        });
    }

    let new_block = scyflow_store::NewBlock {
        name: manifest.name.clone(),
        custom_name: req.custom_name,
        description: manifest.description.clone(),
        author: manifest.author.clone(),
        docker_image: manifest.docker_image.clone(),
        repo_url: req.repo_url,
        x_pos: req.x_pos,
        y_pos: req.y_pos,
    };
    let new_entrypoint = scyflow_store::NewEntrypoint {
        name: req.entrypoint,
        description: entry_manifest.description.clone(),
        envs,
        ports,
        selected: true,
    };

    let ingested = state.store.ingest_block(project_id, new_block, vec![new_entrypoint]).await?;
    Ok(Json(ingested))
}

fn apply_output_defaults(state: &AppState, data_type: DataType, io_name: &str, config: &mut ConfigMap) {
    let (defaults, keys) = match data_type {
        DataType::File => (
            state.file_defaults.build(io_name),
            scyflow_core::defaults::FILE_DEFAULT_KEYS,
        ),
        DataType::PgTable => (
            state.pg_defaults.build(io_name),
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

async fn delete_block(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project_id, block_id)): Path<(ScyflowUuid, ScyflowUuid)>,
) -> Result<()> {
    require_member(&state, project_id, &principal).await?;
    state.store.delete_block(block_id).await?;
    Ok(())
}

// ============================================================================
// Edges
// ============================================================================

#[derive(Deserialize)]
struct EdgeRequest {
    source_output_id: ScyflowUuid,
    target_input_id: ScyflowUuid,
}

async fn create_edge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
    Json(req): Json<EdgeRequest>,
) -> Result<Json<scyflow_core::model::Edge>> {
    require_member(&state, project_id, &principal).await?;
    let edge = state.store.create_edge(req.source_output_id, req.target_input_id).await?;
    Ok(Json(edge))
}

async fn delete_edge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
    Json(req): Json<EdgeRequest>,
) -> Result<()> {
    require_member(&state, project_id, &principal).await?;
    state.store.delete_edge(req.source_output_id, req.target_input_id).await?;
    Ok(())
}

// ============================================================================
// Config updates
// ============================================================================

async fn update_port_config(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project_id, port_id)): Path<(ScyflowUuid, ScyflowUuid)>,
    Json(update): Json<ConfigMap>,
) -> Result<()> {
    require_member(&state, project_id, &principal).await?;
    state.store.update_port_config(port_id, update).await?;
    Ok(())
}

async fn update_entrypoint_envs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project_id, entrypoint_id)): Path<(ScyflowUuid, ScyflowUuid)>,
    Json(update): Json<ConfigMap>,
) -> Result<()> {
    require_member(&state, project_id, &principal).await?;
    state.store.update_entrypoint_envs(entrypoint_id, update).await?;
    Ok(())
}

// ============================================================================
// Templates
// ============================================================================

async fn list_templates(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
) -> Result<Json<Vec<TemplateSummary>>> {
    require_member(&state, project_id, &principal).await?;
    let templates = scyflow_template::list_templates(&state.manifest_loader, &state.config.template_repo_url).await?;
    Ok(Json(templates.iter().map(TemplateSummary::from).collect()))
}

#[derive(Serialize)]
struct TemplateSummary {
    identifier: String,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
}

impl From<&scyflow_template::TemplateDocument> for TemplateSummary {
    fn from(doc: &scyflow_template::TemplateDocument) -> Self {
        Self {
            identifier: doc.file_identifier.clone(),
            name: doc.pipeline.name.clone(),
            description: doc.pipeline.description.clone(),
            tags: doc.pipeline.tags.clone(),
        }
    }
}

#[derive(Deserialize)]
struct InstantiateTemplateRequest {
    identifier: String,
}

async fn instantiate_template(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
    Json(req): Json<InstantiateTemplateRequest>,
) -> Result<Json<scyflow_store::InstantiatedTemplate>> {
    require_member(&state, project_id, &principal).await?;
    let doc =
        scyflow_template::get_template(&state.manifest_loader, &state.config.template_repo_url, &req.identifier)
            .await?;
    let instantiated = state.template_engine.instantiate(&doc, project_id).await?;
    Ok(Json(instantiated))
}

// ============================================================================
// Workflow configuration view (§4.I)
// ============================================================================

#[derive(Serialize)]
struct PortConfigView {
    port_id: ScyflowUuid,
    block_id: ScyflowUuid,
    block_name: String,
    entrypoint_id: ScyflowUuid,
    name: String,
    data_type: DataType,
    config: ConfigMap,
}

#[derive(Serialize)]
struct EnvConfigView {
    entrypoint_id: ScyflowUuid,
    block_id: ScyflowUuid,
    block_name: String,
    key: String,
    value: ConfigValue,
}

#[derive(Serialize)]
struct WorkflowConfigResponse {
    unconfigured_envs: Vec<EnvConfigView>,
    workflow_inputs: Vec<PortConfigView>,
    intermediates: Vec<PortConfigView>,
    workflow_outputs: Vec<PortConfigView>,
    download_urls: std::collections::HashMap<ScyflowUuid, String>,
}

struct Buckets {
    unconfigured_envs: Vec<EnvConfigView>,
    workflow_inputs: Vec<PortConfigView>,
    intermediates: Vec<PortConfigView>,
    workflow_outputs: Vec<PortConfigView>,
    file_port_ids: HashSet<ScyflowUuid>,
}

/// Splits a project's graph into the four buckets of §4.I. Connectivity is
/// decided from the edge set; "unconfigured" uses
/// [`ConfigValue::is_unconfigured`].
fn categorize(graph: &scyflow_store::ProjectGraph) -> Buckets {
    let block_by_id: BTreeMap<ScyflowUuid, &Block> = graph.blocks.iter().map(|b| (b.id, b)).collect();
    let entrypoint_block: BTreeMap<ScyflowUuid, ScyflowUuid> =
        graph.entrypoints.iter().map(|e| (e.id, e.block_id)).collect();
    let upstream_connected: HashSet<ScyflowUuid> = graph.edges.iter().map(|e| e.upstream_output_id).collect();
    let downstream_connected: HashSet<ScyflowUuid> = graph.edges.iter().map(|e| e.downstream_input_id).collect();

    let mut workflow_inputs = Vec::new();
    let mut workflow_outputs = Vec::new();
    let mut intermediates = Vec::new();
    let mut file_port_ids = HashSet::new();

    let view = |port: &Port| -> PortConfigView {
        let block_id = entrypoint_block[&port.entrypoint_id];
        let block_name = block_by_id.get(&block_id).map(|b| b.custom_name.clone()).unwrap_or_default();
        PortConfigView {
            port_id: port.id,
            block_id,
            block_name,
            entrypoint_id: port.entrypoint_id,
            name: port.name.clone(),
            data_type: port.data_type,
            config: port.config.clone(),
        }
    };

    for port in &graph.ports {
        if port.data_type == DataType::File {
            file_port_ids.insert(port.id);
        }
        match port.direction {
            Direction::Input => {
                if downstream_connected.contains(&port.id) {
                    if port.data_type == DataType::Custom && port.config.values().any(ConfigValue::is_unconfigured) {
                        intermediates.push(view(port));
                    }
                } else {
                    workflow_inputs.push(view(port));
                }
            }
            Direction::Output => {
                if upstream_connected.contains(&port.id) {
                    intermediates.push(view(port));
                } else {
                    workflow_outputs.push(view(port));
                }
            }
        }
    }

    let mut unconfigured_envs = Vec::new();
    for entrypoint in &graph.entrypoints {
        let block_id = entrypoint.block_id;
        let block_name = block_by_id.get(&block_id).map(|b| b.custom_name.clone()).unwrap_or_default();
        for (key, value) in &entrypoint.envs {
            if value.is_unconfigured() {
                unconfigured_envs.push(EnvConfigView {
                    entrypoint_id: entrypoint.id,
                    block_id,
                    block_name: block_name.clone(),
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    Buckets {
        unconfigured_envs,
        workflow_inputs,
        intermediates,
        workflow_outputs,
        file_port_ids,
    }
}

async fn get_workflow_config(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
) -> Result<Json<WorkflowConfigResponse>> {
    require_member(&state, project_id, &principal).await?;
    let graph = state.store.fetch_project_graph(project_id).await?;
    let buckets = categorize(&graph);

    let file_ports: Vec<&Port> = graph.ports.iter().filter(|p| buckets.file_port_ids.contains(&p.id)).collect();
    let download_urls = state.artifacts.bulk_download_urls(&file_ports).await;

    Ok(Json(WorkflowConfigResponse {
        unconfigured_envs: buckets.unconfigured_envs,
        workflow_inputs: buckets.workflow_inputs,
        intermediates: buckets.intermediates,
        workflow_outputs: buckets.workflow_outputs,
        download_urls,
    }))
}

/// Collects, per block, every config key still unset among the ports/envs
/// that bound a run's required configuration surface — everything except
/// connected, already-propagated outputs.
fn missing_config(buckets: &Buckets, block_by_id: &BTreeMap<ScyflowUuid, &Block>) -> Vec<UnsetBlockConfig> {
    let mut per_block: BTreeMap<ScyflowUuid, Vec<String>> = BTreeMap::new();

    for port in buckets.workflow_inputs.iter().chain(buckets.workflow_outputs.iter()) {
        let unset: Vec<String> = port
            .config
            .iter()
            .filter(|(_, v)| v.is_unconfigured())
            .map(|(k, _)| format!("{}.{}", port.name, k))
            .collect();
        if !unset.is_empty() {
            per_block.entry(port.block_id).or_default().extend(unset);
        }
    }
    for port in &buckets.intermediates {
        let unset: Vec<String> = port
            .config
            .iter()
            .filter(|(_, v)| v.is_unconfigured())
            .map(|(k, _)| format!("{}.{}", port.name, k))
            .collect();
        if !unset.is_empty() {
            per_block.entry(port.block_id).or_default().extend(unset);
        }
    }
    for env in &buckets.unconfigured_envs {
        per_block.entry(env.block_id).or_default().push(format!("env.{}", env.key));
    }

    per_block
        .into_iter()
        .map(|(block_id, unset_keys)| UnsetBlockConfig {
            block_id,
            block_name: block_by_id.get(&block_id).map(|b| b.custom_name.clone()).unwrap_or_default(),
            unset_keys,
        })
        .collect()
}

// ============================================================================
// Run launch (§4.G)
// ============================================================================

#[derive(Serialize)]
struct RunResponse {
    dag_run_id: String,
}

/// Validate configuration completeness, compile, register, unpause,
/// trigger — the run-launch sequence, each step surfacing its own error.
async fn launch_run(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ScyflowUuid>,
) -> Result<Json<RunResponse>> {
    require_member(&state, project_id, &principal).await?;

    let graph = state.store.fetch_project_graph(project_id).await?;
    if graph.blocks.is_empty() {
        return Err(ApiError::EmptyProject);
    }

    let block_by_id: BTreeMap<ScyflowUuid, &Block> = graph.blocks.iter().map(|b| (b.id, b)).collect();
    let buckets = categorize(&graph);
    let unset = missing_config(&buckets, &block_by_id);
    if !unset.is_empty() {
        return Err(ApiError::MissingConfig(unset));
    }

    let dag_path = state.dag_compiler.compile(project_id, &state.config.dag_dir).await?;
    let dag_id = scyflow_dag::project_id_to_dag_id(project_id);
    let _ = dag_path;

    state
        .orchestrator
        .register(
            &dag_id,
            state.config.dag_registration_timeout,
            state.config.dag_registration_poll_interval,
        )
        .await?;
    state.orchestrator.unpause(&dag_id).await?;
    let dag_run_id = state.orchestrator.trigger(&dag_id).await?;

    Ok(Json(RunResponse { dag_run_id }))
}

#[cfg(test)]
mod tests {
    use scyflow_core::model::{Edge, Entrypoint, SchedulingHints};
    use uuid::Uuid;

    use super::*;

    fn block(id: ScyflowUuid, custom_name: &str) -> Block {
        Block {
            id,
            project_id: Uuid::new_v4(),
            name: "block".into(),
            custom_name: custom_name.into(),
            description: None,
            author: None,
            docker_image: "scyflow/noop:latest".into(),
            repo_url: "https://example.invalid/repo.git".into(),
            x_pos: 0.0,
            y_pos: 0.0,
            selected_entrypoint_id: None,
            scheduling: SchedulingHints::default(),
        }
    }

    fn entrypoint(id: ScyflowUuid, block_id: ScyflowUuid) -> Entrypoint {
        Entrypoint {
            id,
            block_id,
            name: "main".into(),
            description: None,
            envs: ConfigMap::new(),
        }
    }

    fn port(id: ScyflowUuid, entrypoint_id: ScyflowUuid, direction: Direction, data_type: DataType) -> Port {
        Port {
            id,
            entrypoint_id,
            direction,
            name: "p".into(),
            data_type,
            description: None,
            config: ConfigMap::new(),
        }
    }

    /// Empty project -> run launch returns `EMPTY_PROJECT`, distinct from
    /// `MISSING_CONFIG` (§8 boundary).
    #[test]
    fn empty_graph_has_no_blocks_to_report_missing_config_for() {
        let graph = scyflow_store::ProjectGraph::default();
        assert!(graph.blocks.is_empty());
        let buckets = categorize(&graph);
        let block_by_id = BTreeMap::new();
        assert!(missing_config(&buckets, &block_by_id).is_empty());
    }

    /// A disconnected input port whose only config key is null is a
    /// workflow input with an unconfigured key — and so shows up in
    /// `missing_config`.
    #[test]
    fn unconnected_input_with_null_config_is_a_workflow_input_with_missing_config() {
        let block_id = Uuid::new_v4();
        let entrypoint_id = Uuid::new_v4();
        let port_id = Uuid::new_v4();

        let mut input = port(port_id, entrypoint_id, Direction::Input, DataType::Custom);
        input.config.insert("TARGET_PATH".into(), ConfigValue::Null);

        let graph = scyflow_store::ProjectGraph {
            blocks: vec![block(block_id, "loader")],
            entrypoints: vec![entrypoint(entrypoint_id, block_id)],
            ports: vec![input],
            edges: vec![],
        };

        let buckets = categorize(&graph);
        assert_eq!(buckets.workflow_inputs.len(), 1);
        assert!(buckets.intermediates.is_empty());

        let block_by_id: BTreeMap<ScyflowUuid, &Block> = graph.blocks.iter().map(|b| (b.id, b)).collect();
        let unset = missing_config(&buckets, &block_by_id);
        assert_eq!(unset.len(), 1);
        assert_eq!(unset[0].block_name, "loader");
        assert_eq!(unset[0].unset_keys, vec!["p.TARGET_PATH".to_string()]);
    }

    /// A connected `CUSTOM` input with every key configured is not an
    /// intermediate requiring attention — §8's "all config keys null/empty"
    /// boundary, inverted: fully configured means no missing-config entry.
    #[test]
    fn connected_custom_input_with_values_set_reports_nothing_missing() {
        let block_id = Uuid::new_v4();
        let entrypoint_id = Uuid::new_v4();
        let input_id = Uuid::new_v4();
        let output_id = Uuid::new_v4();

        let mut input = port(input_id, entrypoint_id, Direction::Input, DataType::Custom);
        input.config.insert("MODE".into(), ConfigValue::String("batch".into()));

        let graph = scyflow_store::ProjectGraph {
            blocks: vec![block(block_id, "consumer")],
            entrypoints: vec![entrypoint(entrypoint_id, block_id)],
            ports: vec![input],
            edges: vec![Edge {
                upstream_block_id: Uuid::new_v4(),
                upstream_output_id: output_id,
                downstream_block_id: block_id,
                downstream_input_id: input_id,
            }],
        };

        let buckets = categorize(&graph);
        assert!(buckets.workflow_inputs.is_empty());
        assert!(buckets.intermediates.is_empty());

        let block_by_id: BTreeMap<ScyflowUuid, &Block> = graph.blocks.iter().map(|b| (b.id, b)).collect();
        assert!(missing_config(&buckets, &block_by_id).is_empty());
    }

    /// A `FILE`-typed output not yet wired to anything is a workflow output
    /// and its port id is tracked for the download-url lookup.
    #[test]
    fn unconnected_file_output_is_a_workflow_output_and_is_download_eligible() {
        let block_id = Uuid::new_v4();
        let entrypoint_id = Uuid::new_v4();
        let output_id = Uuid::new_v4();

        let output = port(output_id, entrypoint_id, Direction::Output, DataType::File);

        let graph = scyflow_store::ProjectGraph {
            blocks: vec![block(block_id, "writer")],
            entrypoints: vec![entrypoint(entrypoint_id, block_id)],
            ports: vec![output],
            edges: vec![],
        };

        let buckets = categorize(&graph);
        assert_eq!(buckets.workflow_outputs.len(), 1);
        assert!(buckets.file_port_ids.contains(&output_id));
    }

    /// An output already feeding a downstream edge is an intermediate, not
    /// a workflow output.
    #[test]
    fn connected_output_is_an_intermediate_not_a_workflow_output() {
        let block_id = Uuid::new_v4();
        let entrypoint_id = Uuid::new_v4();
        let output_id = Uuid::new_v4();

        let output = port(output_id, entrypoint_id, Direction::Output, DataType::File);

        let graph = scyflow_store::ProjectGraph {
            blocks: vec![block(block_id, "writer")],
            entrypoints: vec![entrypoint(entrypoint_id, block_id)],
            ports: vec![output],
            edges: vec![Edge {
                upstream_block_id: block_id,
                upstream_output_id: output_id,
                downstream_block_id: Uuid::new_v4(),
                downstream_input_id: Uuid::new_v4(),
            }],
        };

        let buckets = categorize(&graph);
        assert!(buckets.workflow_outputs.is_empty());
        assert_eq!(buckets.intermediates.len(), 1);
    }

    /// An unconfigured entrypoint env key surfaces in `missing_config` under
    /// the `env.` prefix, independent of any port.
    #[test]
    fn unconfigured_env_is_reported_under_the_env_prefix() {
        let block_id = Uuid::new_v4();
        let entrypoint_id = Uuid::new_v4();

        let mut entry = entrypoint(entrypoint_id, block_id);
        entry.envs.insert("LOG_LEVEL".into(), ConfigValue::Null);

        let graph = scyflow_store::ProjectGraph {
            blocks: vec![block(block_id, "runner")],
            entrypoints: vec![entry],
            ports: vec![],
            edges: vec![],
        };

        let buckets = categorize(&graph);
        assert_eq!(buckets.unconfigured_envs.len(), 1);

        let block_by_id: BTreeMap<ScyflowUuid, &Block> = graph.blocks.iter().map(|b| (b.id, b)).collect();
        let unset = missing_config(&buckets, &block_by_id);
        assert_eq!(unset.len(), 1);
        assert_eq!(unset[0].unset_keys, vec!["env.LOG_LEVEL".to_string()]);
    }
}
