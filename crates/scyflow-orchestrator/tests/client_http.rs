//! Exercises the orchestrator client against a mock HTTP server: token
//! exchange, 401-triggered re-authentication, and the DAG-registration
//! wait-poll loop.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use scyflow_orchestrator::{Client, OrchestratorConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> Client {
    Client::new(OrchestratorConfig {
        base_url: server.uri(),
        token_url: format!("{}/auth/token", server.uri()),
        username: "svc".into(),
        password: "secret".into(),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn list_dags_acquires_a_token_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dags": [{"dag_id": "dag_a"}, {"dag_id": "dag_b"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let dags = client.list_dags().await.unwrap();
    assert_eq!(dags, vec!["dag_a".to_string(), "dag_b".to_string()]);
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_the_call_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-expired"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-fresh"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dags"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dags": []})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let dags = client.list_dags().await.unwrap();
    assert!(dags.is_empty());
}

#[tokio::test]
async fn register_polls_until_the_dag_is_known() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dags/dag_1"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dags/dag_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dag_id": "dag_1"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .register("dag_1", Duration::from_secs(5), Duration::from_millis(10))
        .await
        .unwrap();
}

#[tokio::test]
async fn register_times_out_if_the_dag_never_appears() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dags/dag_missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client
        .register("dag_missing", Duration::from_millis(50), Duration::from_millis(10))
        .await;
    assert!(result.is_err());
}
