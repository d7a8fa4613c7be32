//! Invocation configuration
//!
//! All process environment access happens here, once, at invocation entry.
//! Components receive the resulting struct and never read ambient state.

use crate::error::{Error, Result};

/// Fixed API paths and identifiers shared across the pipeline.
pub const CURRENT_TENANT_API: &str = "/tenants/current?sensitive=true";
pub const CHECK_FT_STATUS_API: &str = "/config/toggledFeatures/check?featureName=";
pub const USER_HUB_API: &str = "/user-management/v1/users";
pub const EXPORT_FEATURE_TOGGLE: &str = "release-wfm-RTACsvExportFromSFDL-CXWFM-30711";
pub const ORIGINATING_SERVICE: &str = "lambda-wfm-snowflake-data-export";
pub const SUPPORTED_REPORT: &str = "adherenceV2";
pub const SCHEDULING_UNIT_FILTER: &str = "schedulingUnits";
pub const WFM_APPLICATION_ID: &str = "WFM";

/// Presigned URLs expire after one minute.
pub const SIGNED_URL_EXPIRY_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the CXone service host.
    pub service_url: String,
    /// Bucket the rendered CSV lands in.
    pub datalake_bucket: String,
    /// Secrets Manager id holding the warehouse credentials.
    pub warehouse_secret_id: String,
    /// Enables debug-level diagnostics for the invocation.
    pub debug: bool,
}

impl Config {
    /// Reads the configuration from the process environment. The service
    /// host is required; a missing host is surfaced as `InvalidHost` so the
    /// handler can fail before any upstream call.
    pub fn from_env() -> Result<Self> {
        let service_url = std::env::var("SERVICE_URL").map_err(|_| Error::InvalidHost)?;
        if service_url.is_empty() {
            return Err(Error::InvalidHost);
        }

        let datalake_bucket = std::env::var("DATALAKE_BUCKET")
            .map_err(|_| Error::Config("DATALAKE_BUCKET is not set".into()))?;
        let warehouse_secret_id = std::env::var("WAREHOUSE_SECRET_ID")
            .map_err(|_| Error::Config("WAREHOUSE_SECRET_ID is not set".into()))?;
        let debug = std::env::var("DEBUG")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            service_url,
            datalake_bucket,
            warehouse_secret_id,
            debug,
        })
    }
}
