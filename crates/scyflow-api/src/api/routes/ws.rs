//! Status-stream WebSocket channels (§4.I design notes, §6): two
//! independently-polled push channels, each modeled as a ticker-driven
//! actor that stops on client disconnect or unrecoverable upstream failure.
//!
//! Authenticated like every other route, but via a bearer claim carried in
//! either the configured principal header or a `principal` query parameter
//! — browsers cannot set custom headers on a WebSocket handshake, so the
//! query-parameter path is the one real clients use.

use std::collections::HashMap;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use scyflow_core::ScyflowUuid;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflow/ws/project_status", get(project_status_ws))
        .route("/workflow/ws/workflow_status/:project_id", get(workflow_status_ws))
}

#[derive(Deserialize)]
struct WsAuthQuery {
    principal: Option<String>,
}

fn extract_principal(state: &AppState, headers: &HeaderMap, query: &WsAuthQuery) -> Result<ScyflowUuid, ApiError> {
    let from_header = headers
        .get(state.config.principal_header.as_str())
        .and_then(|v| v.to_str().ok());
    let raw = from_header.or(query.principal.as_deref()).ok_or(ApiError::Unauthenticated)?;
    ScyflowUuid::parse_str(raw).map_err(|_| ApiError::Unauthenticated)
}

fn close_frame(reason: String) -> Option<CloseFrame<'static>> {
    Some(CloseFrame {
        code: axum::extract::ws::close_code::ERROR,
        reason: reason.into(),
    })
}

// ============================================================================
// /workflow/ws/project_status — fan-out across every project the caller
// belongs to.
// ============================================================================

async fn project_status_ws(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let principal = extract_principal(&state, &headers, &query)?;
    Ok(ws.on_upgrade(move |socket| project_status_stream(socket, state, principal)))
}

async fn project_status_stream(mut socket: WebSocket, state: AppState, principal: ScyflowUuid) {
    #[cfg(feature = "metrics")]
    if let Some(m) = state.metrics() {
        m.adjust_ws_subscribers("project_status", 1);
    }

    let mut ticker = tokio::time::interval(state.config.status_poll_interval);

    'outer: loop {
        tokio::select! {
            _ = ticker.tick() => {
                let projects = match state.store.list_projects_for_user(principal).await {
                    Ok(p) => p,
                    Err(e) => {
                        let _ = socket.send(Message::Close(close_frame(e.to_string()))).await;
                        break 'outer;
                    }
                };

                let dag_ids: Vec<String> = projects.iter().map(|p| scyflow_dag::project_id_to_dag_id(p.id)).collect();
                if dag_ids.is_empty() {
                    if socket.send(Message::Text("{}".to_string())).await.is_err() {
                        break 'outer;
                    }
                    continue;
                }

                match state.orchestrator.last_run_batch(&dag_ids).await {
                    Ok(runs) => {
                        let payload: HashMap<String, scyflow_orchestrator::WorkflowState> = runs
                            .into_iter()
                            .map(|(dag_id, run)| {
                                let projected = scyflow_orchestrator::project_workflow_state(run.state.as_deref());
                                (dag_id, projected)
                            })
                            .collect();
                        let body = serde_json::to_string(&payload).unwrap_or_default();
                        if socket.send(Message::Text(body)).await.is_err() {
                            break 'outer;
                        }
                    }
                    Err(e) => {
                        let _ = socket.send(Message::Close(close_frame(e.to_string()))).await;
                        break 'outer;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => continue,
                    _ => break 'outer,
                }
            }
        }
    }

    #[cfg(feature = "metrics")]
    if let Some(m) = state.metrics() {
        m.adjust_ws_subscribers("project_status", -1);
    }
}

// ============================================================================
// /workflow/ws/workflow_status/:project_id — per-block task state of one
// project's latest run.
// ============================================================================

async fn workflow_status_ws(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsAuthQuery>,
    Path(project_id): Path<ScyflowUuid>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let principal = extract_principal(&state, &headers, &query)?;
    if !state.store.is_member(project_id, principal).await? {
        return Err(ApiError::NotMember);
    }
    Ok(ws.on_upgrade(move |socket| workflow_status_stream(socket, state, project_id)))
}

async fn workflow_status_stream(mut socket: WebSocket, state: AppState, project_id: ScyflowUuid) {
    #[cfg(feature = "metrics")]
    if let Some(m) = state.metrics() {
        m.adjust_ws_subscribers("workflow_status", 1);
    }

    let dag_id = scyflow_dag::project_id_to_dag_id(project_id);
    let mut ticker = tokio::time::interval(state.config.status_poll_interval);

    'outer: loop {
        tokio::select! {
            _ = ticker.tick() => {
                let latest = match state.orchestrator.latest_run(&dag_id).await {
                    Ok(run) => run,
                    Err(e) => {
                        let _ = socket.send(Message::Close(close_frame(e.to_string()))).await;
                        break 'outer;
                    }
                };

                let Some(run) = latest else {
                    if socket.send(Message::Text("{}".to_string())).await.is_err() {
                        break 'outer;
                    }
                    continue;
                };

                match state.orchestrator.task_states(&dag_id, &run.dag_run_id).await {
                    Ok(states) => {
                        let payload: HashMap<String, scyflow_orchestrator::BlockState> = states
                            .into_iter()
                            .map(|(task_id, raw)| {
                                let block_id = scyflow_dag::task_id_to_block_id(&task_id)
                                    .map(|id| id.to_string())
                                    .unwrap_or(task_id);
                                (block_id, scyflow_orchestrator::project_block_state(raw.as_deref()))
                            })
                            .collect();
                        let body = serde_json::to_string(&payload).unwrap_or_default();
                        if socket.send(Message::Text(body)).await.is_err() {
                            break 'outer;
                        }
                    }
                    Err(e) => {
                        let _ = socket.send(Message::Close(close_frame(e.to_string()))).await;
                        break 'outer;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => continue,
                    _ => break 'outer,
                }
            }
        }
    }

    #[cfg(feature = "metrics")]
    if let Some(m) = state.metrics() {
        m.adjust_ws_subscribers("workflow_status", -1);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::api::state::ServerConfig;

    fn test_state() -> AppState {
        let store = scyflow_store::Store::connect(&scyflow_store::StoreConfig {
            host: "postgres.invalid".to_string(),
            port: 5432,
            user: "test".to_string(),
            password: "test".to_string(),
            dbname: "scyflow_test".to_string(),
            max_pool_size: 1,
        })
        .expect("store pool construct");
        let manifest_loader = scyflow_manifest::ManifestLoader::new();
        let file_defaults = scyflow_core::defaults::FileDefaults {
            s3_host: "minio.internal".to_string(),
            s3_port: 9000,
            s3_access_key: "test".to_string(),
            s3_secret_key: "test".to_string(),
            bucket_name: "scyflow".to_string(),
        };
        let pg_defaults = scyflow_core::defaults::PgTableDefaults {
            pg_user: "test".to_string(),
            pg_pass: "test".to_string(),
            pg_host: "postgres.internal".to_string(),
            pg_port: 5432,
        };

        AppState::new(
            store.clone(),
            manifest_loader.clone(),
            scyflow_template::TemplateEngine::new(
                manifest_loader,
                store.clone(),
                file_defaults.clone(),
                pg_defaults.clone(),
            ),
            scyflow_dag::DagCompiler::new(
                store,
                scyflow_dag::DagRenderConfig {
                    network_mode: "scyflow_net".to_string(),
                    local_storage_path_external: "/var/lib/scyflow/data".to_string(),
                },
            ),
            scyflow_orchestrator::Client::new(scyflow_orchestrator::OrchestratorConfig {
                base_url: "http://orchestrator.invalid".to_string(),
                token_url: "http://orchestrator.invalid/token".to_string(),
                username: "test".to_string(),
                password: "test".to_string(),
                request_timeout: std::time::Duration::from_secs(1),
            })
            .expect("orchestrator client construct"),
            scyflow_artifacts::ArtifactLocator::new(scyflow_artifacts::ArtifactLocatorConfig {
                internal_host: "http://minio.internal".to_string(),
                external_base_url: "http://minio.external".to_string(),
                presigned_get_ttl: std::time::Duration::from_secs(900),
                presigned_put_ttl: std::time::Duration::from_secs(900),
            }),
            file_defaults,
            pg_defaults,
            ServerConfig::default(),
        )
    }

    #[test]
    fn header_claim_wins_over_query_claim() {
        let state = test_state();
        let id = ScyflowUuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            state.config.principal_header.as_str(),
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        let query = WsAuthQuery {
            principal: Some(ScyflowUuid::new_v4().to_string()),
        };
        assert_eq!(extract_principal(&state, &headers, &query).unwrap(), id);
    }

    #[test]
    fn query_claim_is_used_when_no_header_is_set() {
        let state = test_state();
        let id = ScyflowUuid::new_v4();
        let query = WsAuthQuery {
            principal: Some(id.to_string()),
        };
        assert_eq!(extract_principal(&state, &HeaderMap::new(), &query).unwrap(), id);
    }

    #[test]
    fn no_claim_anywhere_is_unauthenticated() {
        let state = test_state();
        let query = WsAuthQuery { principal: None };
        assert!(matches!(
            extract_principal(&state, &HeaderMap::new(), &query),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn malformed_claim_is_unauthenticated() {
        let state = test_state();
        let query = WsAuthQuery {
            principal: Some("not-a-uuid".to_string()),
        };
        assert!(matches!(
            extract_principal(&state, &HeaderMap::new(), &query),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn close_frame_carries_the_reason_and_the_error_close_code() {
        let frame = close_frame("boom".to_string()).unwrap();
        assert_eq!(frame.code, axum::extract::ws::close_code::ERROR);
        assert_eq!(frame.reason, "boom");
    }
}
