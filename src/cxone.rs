//! CXone platform API client
//!
//! Covers the three upstream calls the pipeline makes: tenant resolution,
//! feature-toggle check and the user-hub directory lookup. The `CxoneApi`
//! trait is the seam used by tests; `CxoneClient` is the reqwest-backed
//! implementation.

use crate::config::{
    Config, CHECK_FT_STATUS_API, CURRENT_TENANT_API, ORIGINATING_SERVICE, USER_HUB_API,
    WFM_APPLICATION_ID,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolved tenant identity.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: String,
    pub schema_name: String,
    #[serde(default)]
    pub licenses: Vec<License>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub application_id: String,
}

impl Tenant {
    /// License gate: true iff some license entry carries the WFM
    /// application id. Pure, no I/O.
    pub fn has_wfm_license(&self) -> bool {
        self.licenses
            .iter()
            .any(|l| l.application_id == WFM_APPLICATION_ID)
    }
}

#[derive(Debug, Deserialize)]
struct TenantEnvelope {
    tenant: Tenant,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<DirectoryUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
}

/// Seam over the CXone HTTP APIs.
#[async_trait]
pub trait CxoneApi: Send + Sync {
    /// Exchanges the bearer token for the tenant record.
    async fn current_tenant(&self, token: &str) -> Result<Tenant>;

    /// Checks the export feature toggle for the tenant. Upstream failure
    /// propagates; the gate never degrades silently.
    async fn is_feature_enabled(
        &self,
        token: &str,
        schema_name: &str,
        feature: &str,
    ) -> Result<bool>;

    /// Lists the tenant's users and projects their ids, preserving order.
    async fn list_users(&self, token: &str, schema_name: &str) -> Result<Vec<String>>;
}

pub struct CxoneClient {
    client: Client,
    host: String,
}

impl CxoneClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.service_url.is_empty() {
            return Err(Error::InvalidHost);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            host: config.service_url.clone(),
        })
    }

    /// Builds a GET request with bearer auth. User-hub and toggle endpoints
    /// are tenant-sensitive and additionally carry the tenant schema and the
    /// originating-service identifier.
    fn get(&self, path: &str, token: &str, schema_name: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(format!("{}{}", self.host, path))
            .bearer_auth(token)
            .header("Content-Type", "application/json");
        if let Some(schema) = schema_name {
            request = request
                .header("tenant", schema)
                .header("Originating-Service-Identifier", ORIGINATING_SERVICE);
        }
        request
    }
}

#[async_trait]
impl CxoneApi for CxoneClient {
    async fn current_tenant(&self, token: &str) -> Result<Tenant> {
        debug!("resolving tenant via {CURRENT_TENANT_API}");
        let response = self
            .get(CURRENT_TENANT_API, token, None)
            .send()
            .await
            .map_err(|e| Error::UpstreamAuthFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamAuthFailure(format!(
                "identity API returned {}",
                response.status()
            )));
        }

        let envelope: TenantEnvelope = response
            .json()
            .await
            .map_err(|e| Error::UpstreamAuthFailure(format!("malformed tenant payload: {e}")))?;
        debug!(tenant_id = %envelope.tenant.tenant_id, "tenant resolved");
        Ok(envelope.tenant)
    }

    async fn is_feature_enabled(
        &self,
        token: &str,
        schema_name: &str,
        feature: &str,
    ) -> Result<bool> {
        let path = format!("{CHECK_FT_STATUS_API}{feature}");
        debug!("checking feature toggle via {path}");
        let response = self
            .get(&path, token, Some(schema_name))
            .send()
            .await
            .map_err(|e| {
                warn!("feature toggle check failed: {e}");
                Error::FeatureDisabled
            })?;

        if !response.status().is_success() {
            warn!("feature toggle check returned {}", response.status());
            return Err(Error::FeatureDisabled);
        }

        response.json::<bool>().await.map_err(|e| {
            warn!("malformed feature toggle payload: {e}");
            Error::FeatureDisabled
        })
    }

    async fn list_users(&self, token: &str, schema_name: &str) -> Result<Vec<String>> {
        debug!("listing users via {USER_HUB_API}");
        let response = self
            .get(USER_HUB_API, token, Some(schema_name))
            .send()
            .await
            .map_err(|e| Error::DirectoryFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::DirectoryFailure(format!(
                "user hub returned {}",
                response.status()
            )));
        }

        let envelope: UsersEnvelope = response
            .json()
            .await
            .map_err(|e| Error::DirectoryFailure(format!("malformed users payload: {e}")))?;
        debug!("user hub returned {} users", envelope.users.len());
        Ok(envelope.users.into_iter().map(|u| u.id).collect())
    }
}
