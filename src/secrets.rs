//! Warehouse credential retrieval from AWS Secrets Manager.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Snowflake connection keys stored as a JSON secret.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseCredentials {
    pub account: String,
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn warehouse_credentials(&self, secret_id: &str) -> Result<WarehouseCredentials>;
}

pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn warehouse_credentials(&self, secret_id: &str) -> Result<WarehouseCredentials> {
        debug!("retrieving secret {secret_id}");
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| Error::QueryFailure(format!("failed to fetch secret: {e}")))?;

        let secret_string = output
            .secret_string()
            .ok_or_else(|| Error::QueryFailure("secret has no string payload".into()))?;

        serde_json::from_str(secret_string)
            .map_err(|e| Error::QueryFailure(format!("malformed warehouse secret: {e}")))
    }
}
