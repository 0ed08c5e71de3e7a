//! Mints a presigned upload URL for a single FILE-typed port. Uses a
//! presigned PUT rather than a multipart POST policy, since that is the
//! shape `aws-sdk-s3`'s presigning API actually exposes.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;

use crate::error::ArtifactError;
use crate::locate::{extract_file_location, rewrite_host};
use crate::pool::S3ClientPool;
use scyflow_core::model::ConfigMap;

/// Resolves a single port's upload URL, or `Ok(None)` if its config is
/// missing a required storage key (the same non-fatal "skip" policy the
/// bulk download resolver uses, surfaced here as an `Option` since there is
/// only one caller to report to).
pub async fn upload_url(
    config: &ConfigMap,
    pool: &S3ClientPool,
    internal_host: &str,
    external_base: &str,
    ttl: Duration,
) -> Result<Option<String>, ArtifactError> {
    let Some(location) = extract_file_location(config) else {
        return Ok(None);
    };

    let key = crate::pool::ClientGroupKey {
        host: location.host.clone(),
        port: location.port.clone(),
        access_key: location.access_key.clone(),
        secret_key: location.secret_key.clone(),
        bucket: location.bucket.clone(),
    };
    let client = pool.get_or_build(&key).await;

    let object_key = if location.file_path.is_empty() {
        location.file_name.clone()
    } else {
        format!("{}/{}", location.file_path.trim_end_matches('/'), location.file_name)
    };

    let presigning_config = PresigningConfig::builder()
        .expires_in(ttl)
        .build()
        .map_err(|e| ArtifactError::Presign(e.to_string()))?;

    let presigned = client
        .put_object()
        .bucket(&location.bucket)
        .key(&object_key)
        .presigned(presigning_config)
        .await
        .map_err(|e| ArtifactError::Presign(e.to_string()))?;

    let url = rewrite_host(&presigned.uri().to_string(), internal_host, &location.port, external_base);
    Ok(Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scyflow_core::model::ConfigValue;

    fn file_config() -> ConfigMap {
        let mut c = ConfigMap::new();
        c.insert("S3_HOST".into(), ConfigValue::String("minio".into()));
        c.insert("S3_PORT".into(), ConfigValue::String("9000".into()));
        c.insert("S3_ACCESS_KEY".into(), ConfigValue::String("ak".into()));
        c.insert("S3_SECRET_KEY".into(), ConfigValue::String("sk".into()));
        c.insert("BUCKET_NAME".into(), ConfigValue::String("data".into()));
        c.insert("FILE_PATH".into(), ConfigValue::String("uploads".into()));
        c.insert("FILE_NAME".into(), ConfigValue::String("file_in_xyz".into()));
        c
    }

    #[tokio::test]
    async fn returns_none_when_required_keys_are_missing() {
        let pool = S3ClientPool::new();
        let mut config = file_config();
        config.remove("BUCKET_NAME");
        let result = upload_url(&config, &pool, "minio", "https://files.example.invalid", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn builds_a_presigned_url_under_the_configured_path() {
        let pool = S3ClientPool::new();
        let config = file_config();
        let url = upload_url(&config, &pool, "minio", "https://files.example.invalid", Duration::from_secs(3600))
            .await
            .unwrap()
            .unwrap();
        assert!(url.starts_with("https://files.example.invalid/data/uploads/file_in_xyz"));
    }
}
