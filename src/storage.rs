//! Data-lake artifact publishing
//!
//! Uploads the rendered CSV under a tenant-scoped key and mints a
//! short-lived presigned URL for retrieval.

use crate::config::SIGNED_URL_EXPIRY_SECS;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Location of a stored artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub bucket: String,
    pub key: String,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes the CSV under the tenant-scoped report key.
    async fn put_report(
        &self,
        bucket: &str,
        schema_name: &str,
        file_name: &str,
        csv_text: String,
    ) -> Result<StoredArtifact>;

    /// Mints a time-limited signed URL for the stored artifact.
    async fn signed_url(&self, artifact: &StoredArtifact) -> Result<String>;
}

/// Key layout: `report/export/{tenantSchema}/adherence/{filename}`.
pub fn report_key(schema_name: &str, file_name: &str) -> String {
    format!("report/export/{schema_name}/adherence/{file_name}")
}

pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
}

impl S3ArtifactStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put_report(
        &self,
        bucket: &str,
        schema_name: &str,
        file_name: &str,
        csv_text: String,
    ) -> Result<StoredArtifact> {
        let key = report_key(schema_name, file_name);
        debug!(bucket, key, "uploading report");

        self.client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(csv_text.into_bytes().into())
            .send()
            .await
            .map_err(|e| Error::StorageWriteFailure(e.to_string()))?;

        info!(bucket, key, "report uploaded");
        Ok(StoredArtifact {
            bucket: bucket.to_string(),
            key,
        })
    }

    async fn signed_url(&self, artifact: &StoredArtifact) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(SIGNED_URL_EXPIRY_SECS))
            .map_err(|e| Error::StorageWriteFailure(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&artifact.bucket)
            .key(&artifact.key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::StorageWriteFailure(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_key_is_tenant_and_report_scoped() {
        assert_eq!(
            report_key("perm_pm_kepler", "20221007155945_admin.csv"),
            "report/export/perm_pm_kepler/adherence/20221007155945_admin.csv"
        );
    }
}
