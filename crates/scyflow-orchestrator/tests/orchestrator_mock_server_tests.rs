//! Integration tests for the workflow-engine client against a mock HTTP
//! server, covering token acquisition, 401-triggered re-auth, run/task
//! status queries, and the bounded registration poll.
//!
//! Run with: cargo test -p scyflow-orchestrator --test orchestrator_mock_server_tests

use std::time::Duration;

use scyflow_orchestrator::{Client, OrchestratorConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(mock: &MockServer) -> OrchestratorConfig {
    OrchestratorConfig {
        base_url: mock.uri(),
        token_url: format!("{}/auth/token", mock.uri()),
        username: "scyflow".to_string(),
        password: "scyflow".to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

async fn mount_token(mock: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": token})))
        .mount(mock)
        .await;
}

#[tokio::test]
async fn list_dags_acquires_a_token_before_the_first_call() {
    let mock = MockServer::start().await;
    mount_token(&mock, "first-token").await;

    Mock::given(method("GET"))
        .and(path("/dags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dags": [{"dag_id": "proj-a"}, {"dag_id": "proj-b"}]
        })))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let dags = client.list_dags().await.unwrap();
    assert_eq!(dags, vec!["proj-a".to_string(), "proj-b".to_string()]);
}

#[tokio::test]
async fn a_rejected_token_is_refreshed_exactly_once_and_the_call_succeeds() {
    let mock = MockServer::start().await;
    mount_token(&mock, "stale-then-fresh").await;

    // First call with the (only) issued token is rejected...
    Mock::given(method("GET"))
        .and(path("/dags/proj-a"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    // ...the retry after re-authenticating succeeds.
    Mock::given(method("GET"))
        .and(path("/dags/proj-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dag_id": "proj-a"})))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    client.register("proj-a", Duration::from_secs(1), Duration::from_millis(10)).await.unwrap();
}

#[tokio::test]
async fn token_endpoint_failure_surfaces_as_authentication_error() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let err = client.list_dags().await.unwrap_err();
    assert!(matches!(err, scyflow_orchestrator::OrchestratorError::Authentication(_)));
}

#[tokio::test]
async fn registration_poll_gives_up_after_the_timeout() {
    let mock = MockServer::start().await;
    mount_token(&mock, "token").await;

    Mock::given(method("GET"))
        .and(path("/dags/never-registers"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let err = client
        .register("never-registers", Duration::from_millis(50), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, scyflow_orchestrator::OrchestratorError::RegistrationTimeout(ref id) if id == "never-registers"));
}

#[tokio::test]
async fn last_run_batch_keeps_only_the_most_recent_run_per_dag() {
    let mock = MockServer::start().await;
    mount_token(&mock, "token").await;

    Mock::given(method("POST"))
        .and(path("/dags/~/dagRuns/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dag_runs": [
                {
                    "dag_run_id": "run-older",
                    "dag_id": "proj-a",
                    "state": "success",
                    "execution_date": "2026-01-01T00:00:00Z"
                },
                {
                    "dag_run_id": "run-newer",
                    "dag_id": "proj-a",
                    "state": "running",
                    "execution_date": "2026-01-02T00:00:00Z"
                },
                {
                    "dag_run_id": "run-only",
                    "dag_id": "proj-b",
                    "state": "failed",
                    "execution_date": "2026-01-01T12:00:00Z"
                }
            ]
        })))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let batch = client
        .last_run_batch(&["proj-a".to_string(), "proj-b".to_string()])
        .await
        .unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch["proj-a"].dag_run_id, "run-newer");
    assert_eq!(batch["proj-b"].dag_run_id, "run-only");
}

#[tokio::test]
async fn last_run_batch_of_no_dags_skips_the_request_entirely() {
    // No mocks mounted at all: a request would panic wiremock's
    // unexpected-request assertion on drop, so an empty result here
    // proves the client short-circuits before calling out.
    let mock = MockServer::start().await;
    let client = Client::new(config_for(&mock)).unwrap();
    let batch = client.last_run_batch(&[]).await.unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn task_states_maps_task_id_to_raw_state_string() {
    let mock = MockServer::start().await;
    mount_token(&mock, "token").await;

    Mock::given(method("GET"))
        .and(path("/dags/proj-a/dagRuns/run-1/taskInstances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_instances": [
                {"task_id": "block_1", "state": "success"},
                {"task_id": "block_2", "state": null}
            ]
        })))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let states = client.task_states("proj-a", "run-1").await.unwrap();
    assert_eq!(states["block_1"], Some("success".to_string()));
    assert_eq!(states["block_2"], None);
}

#[tokio::test]
async fn non_2xx_after_successful_auth_surfaces_as_api_error() {
    let mock = MockServer::start().await;
    mount_token(&mock, "token").await;

    Mock::given(method("POST"))
        .and(path("/dags/proj-a/dagRuns"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock)
        .await;

    let client = Client::new(config_for(&mock)).unwrap();
    let err = client.trigger("proj-a").await.unwrap_err();
    match err {
        scyflow_orchestrator::OrchestratorError::Api { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Api error, got {other:?}"),
    }
}
