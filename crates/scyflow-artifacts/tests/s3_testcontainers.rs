//! Integration tests for the artifact locator against a real S3-compatible
//! backend, started as a LocalStack container via testcontainers.
//!
//! Run with Docker available:
//! ```bash
//! cargo test -p scyflow-artifacts --test s3_testcontainers -- --ignored
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::time::Duration;

use aws_sdk_s3::{
    config::{Credentials, Region},
    Client as S3Client,
};
use scyflow_artifacts::{ArtifactLocator, ArtifactLocatorConfig};
use scyflow_core::model::{ConfigMap, ConfigValue};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::localstack::LocalStack;

async fn create_localstack_client(endpoint_url: &str) -> S3Client {
    let credentials = Credentials::new("test", "test", None, None, "static");
    let config = aws_sdk_s3::Config::builder()
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint_url)
        .credentials_provider(credentials)
        .behavior_version_latest()
        .force_path_style(true)
        .build();

    S3Client::from_conf(config)
}

async fn create_test_bucket(client: &S3Client, bucket_name: &str) {
    let result = client.create_bucket().bucket(bucket_name).send().await;
    if let Err(e) = result {
        if !e.to_string().contains("BucketAlreadyOwnedByYou") && !e.to_string().contains("BucketAlreadyExists") {
            panic!("failed to create bucket: {e:?}");
        }
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
}

async fn start_localstack() -> (testcontainers::ContainerAsync<LocalStack>, String, String) {
    let container = LocalStack::default().start().await.expect("failed to start LocalStack");

    let host = container.get_host().await.unwrap().to_string();
    let port = container.get_host_port_ipv4(4566).await.unwrap();
    let endpoint_url = format!("http://{host}:{port}");

    tokio::time::sleep(Duration::from_secs(5)).await;

    (container, host, endpoint_url)
}

fn file_config(file_name: &str, file_path: &str) -> ConfigMap {
    let mut c = ConfigMap::new();
    c.insert("S3_ACCESS_KEY".into(), ConfigValue::String("test".into()));
    c.insert("S3_SECRET_KEY".into(), ConfigValue::String("test".into()));
    c.insert("BUCKET_NAME".into(), ConfigValue::String("locator-bucket".into()));
    c.insert("FILE_PATH".into(), ConfigValue::String(file_path.into()));
    c.insert("FILE_NAME".into(), ConfigValue::String(file_name.into()));
    c
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn upload_url_round_trips_through_localstack() {
    let (_container, host, endpoint_url) = start_localstack().await;
    let client = create_localstack_client(&endpoint_url).await;
    create_test_bucket(&client, "locator-bucket").await;

    let port_value: u16 = endpoint_url.rsplit(':').next().unwrap().parse().unwrap();

    let mut config = file_config("artifact_one", "runs/run-1");
    config.insert("S3_HOST".into(), ConfigValue::String(host.clone()));
    config.insert("S3_PORT".into(), ConfigValue::String(port_value.to_string()));

    let locator = ArtifactLocator::new(ArtifactLocatorConfig {
        internal_host: host.clone(),
        external_base_url: endpoint_url.clone(),
        presigned_get_ttl: Duration::from_secs(3600),
        presigned_put_ttl: Duration::from_secs(3600),
    });

    let upload_url = locator.upload_url(&config).await.unwrap().expect("port has required keys");

    let body = b"payload";
    let resp = reqwest::Client::new().put(&upload_url).body(body.to_vec()).send().await.unwrap();
    assert!(resp.status().is_success());

    let object = client
        .get_object()
        .bucket("locator-bucket")
        .key("runs/run-1/artifact_one")
        .send()
        .await
        .unwrap();
    let bytes = object.body.collect().await.unwrap().into_bytes();
    assert_eq!(&bytes[..], body);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn bulk_download_urls_matches_by_file_name_substring() {
    let (_container, host, endpoint_url) = start_localstack().await;
    let client = create_localstack_client(&endpoint_url).await;
    create_test_bucket(&client, "locator-bucket").await;

    let port_value: u16 = endpoint_url.rsplit(':').next().unwrap().parse().unwrap();

    client
        .put_object()
        .bucket("locator-bucket")
        .key("runs/run-1/artifact_two_suffix")
        .body(b"contents".to_vec().into())
        .send()
        .await
        .unwrap();

    let mut config = file_config("artifact_two", "runs/run-1");
    config.insert("S3_HOST".into(), ConfigValue::String(host.clone()));
    config.insert("S3_PORT".into(), ConfigValue::String(port_value.to_string()));

    let port_id = uuid::Uuid::new_v4();
    let port = scyflow_core::model::Port {
        id: port_id,
        entrypoint_id: uuid::Uuid::new_v4(),
        direction: scyflow_core::model::Direction::Output,
        name: "out".into(),
        data_type: scyflow_core::model::DataType::File,
        description: None,
        config,
    };

    let locator = ArtifactLocator::new(ArtifactLocatorConfig {
        internal_host: host.clone(),
        external_base_url: endpoint_url.clone(),
        presigned_get_ttl: Duration::from_secs(3600),
        presigned_put_ttl: Duration::from_secs(3600),
    });

    let urls = locator.bulk_download_urls(&[&port]).await;
    assert_eq!(urls.len(), 1);
    assert!(urls.contains_key(&port_id));
}
