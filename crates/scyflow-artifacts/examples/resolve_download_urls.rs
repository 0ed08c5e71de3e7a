//! Resolves download URLs for a handful of FILE-typed ports against a
//! real (or MinIO-compatible) S3 endpoint.
//!
//! # Running
//!
//! ```bash
//! export S3_HOST=localhost
//! export S3_PORT=9000
//! export S3_ACCESS_KEY=minioadmin
//! export S3_SECRET_KEY=minioadmin
//! export BUCKET_NAME=workflow-artifacts
//! cargo run --example resolve_download_urls
//! ```

use std::env;
use std::time::Duration;

use scyflow_artifacts::{ArtifactLocator, ArtifactLocatorConfig};
use scyflow_core::model::{ConfigMap, ConfigValue, DataType, Direction, Port};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let host = env::var("S3_HOST").unwrap_or_else(|_| "localhost".into());
    let port = env::var("S3_PORT").unwrap_or_else(|_| "9000".into());

    let mut config = ConfigMap::new();
    config.insert("S3_HOST".into(), ConfigValue::String(host.clone()));
    config.insert("S3_PORT".into(), ConfigValue::String(port.clone()));
    config.insert(
        "S3_ACCESS_KEY".into(),
        ConfigValue::String(env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".into())),
    );
    config.insert(
        "S3_SECRET_KEY".into(),
        ConfigValue::String(env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".into())),
    );
    config.insert(
        "BUCKET_NAME".into(),
        ConfigValue::String(env::var("BUCKET_NAME").unwrap_or_else(|_| "workflow-artifacts".into())),
    );
    config.insert("FILE_PATH".into(), ConfigValue::String(String::new()));
    config.insert("FILE_NAME".into(), ConfigValue::String("example_output".into()));

    let port = Port {
        id: Uuid::new_v4(),
        entrypoint_id: Uuid::new_v4(),
        direction: Direction::Output,
        name: "out".into(),
        data_type: DataType::File,
        description: None,
        config,
    };

    let locator = ArtifactLocator::new(ArtifactLocatorConfig {
        internal_host: host,
        external_base_url: "https://files.example.invalid".into(),
        presigned_get_ttl: Duration::from_secs(3600),
        presigned_put_ttl: Duration::from_secs(3600),
    });

    let urls = locator.bulk_download_urls(&[&port]).await;
    match urls.get(&port.id) {
        Some(url) => println!("resolved: {url}"),
        None => println!("no matching object found (or bucket unreachable)"),
    }
}
