//! Export pipeline orchestration
//!
//! A strictly linear gate sequence with early exit: credential extraction,
//! tenant resolution, license gate, feature gate, request validation, user
//! directory lookup, warehouse fetch, CSV render, artifact publish. Stage
//! state is threaded explicitly; nothing is read from ambient globals.

use crate::config::{Config, EXPORT_FEATURE_TOGGLE};
use crate::cxone::{CxoneApi, Tenant};
use crate::error::{Error, Result};
use crate::event::{decode_token_claims, ExportEvent};
use crate::metrics::{MetricsWriter, EXPORT_FAILURES_METRIC};
use crate::report::{generate_file_name, render_csv};
use crate::secrets::SecretStore;
use crate::storage::ArtifactStore;
use crate::warehouse::{QueryParams, Warehouse};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sole success payload: the retrieval link.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportResponse {
    pub url: String,
}

pub struct Executor {
    config: Config,
    api: Arc<dyn CxoneApi>,
    warehouse: Arc<dyn Warehouse>,
    secrets: Arc<dyn SecretStore>,
    store: Arc<dyn ArtifactStore>,
    metrics: Arc<MetricsWriter>,
}

impl Executor {
    pub fn new(
        config: Config,
        api: Arc<dyn CxoneApi>,
        warehouse: Arc<dyn Warehouse>,
        secrets: Arc<dyn SecretStore>,
        store: Arc<dyn ArtifactStore>,
        metrics: Arc<MetricsWriter>,
    ) -> Self {
        Self {
            config,
            api,
            warehouse,
            secrets,
            store,
            metrics,
        }
    }

    /// Runs the pipeline to completion or the first classified failure.
    pub async fn run(&self, event: &ExportEvent) -> Result<ExportResponse> {
        info!("0. BEGIN AND VERIFY TOKEN");
        let token = event.bearer_token()?;
        let claims = decode_token_claims(&token);
        debug!(tenant = %claims.tenant, "caller claims decoded");

        info!("1. AUTHENTICATE REQUEST");
        let tenant = self.authenticate(&token, &claims.tenant).await?;

        info!("2. VERIFY WFM LICENSE");
        if !tenant.has_wfm_license() {
            return Err(Error::LicenseDenied);
        }

        info!("3. VERIFY FEATURE TOGGLE");
        if !self
            .api
            .is_feature_enabled(&token, &tenant.schema_name, EXPORT_FEATURE_TOGGLE)
            .await?
        {
            return Err(Error::FeatureDisabled);
        }

        info!("4. VERIFY REQUEST BODY FOR FILTERS");
        if !event.body.is_valid() {
            return Err(Error::InvalidRequest);
        }
        let (from_date, to_date) = event.body.date_window().ok_or(Error::InvalidRequest)?;

        info!("5. GET LIST OF USER IDS");
        let user_ids = self.api.list_users(&token, &tenant.schema_name).await?;

        info!("6. FETCH ADHERENCE DATA");
        let params = QueryParams {
            tenant_id: tenant.tenant_id.clone(),
            scheduling_units: event.body.scheduling_units(),
            user_ids,
            from_date,
            to_date,
        };
        let credentials = self
            .secrets
            .warehouse_credentials(&self.config.warehouse_secret_id)
            .await?;
        let outcome = self.warehouse.fetch_adherence(&credentials, &params).await?;

        info!("7. RENDER AND UPLOAD CSV");
        let csv_text = render_csv(&outcome)?;
        let file_name = generate_file_name(&claims);
        let artifact = self
            .store
            .put_report(
                &self.config.datalake_bucket,
                &tenant.schema_name,
                &file_name,
                csv_text,
            )
            .await?;

        info!("8. GET SIGNED URL");
        let url = self.store.signed_url(&artifact).await?;
        debug!(%url, "export complete");
        Ok(ExportResponse { url })
    }

    /// Resolves the tenant, emitting a failure metric before surfacing any
    /// identity API error.
    async fn authenticate(&self, token: &str, tenant_claim: &str) -> Result<Tenant> {
        match self.api.current_tenant(token).await {
            Ok(tenant) => Ok(tenant),
            Err(e) => {
                let dimension = if tenant_claim.is_empty() {
                    "unknown"
                } else {
                    tenant_claim
                };
                self.metrics
                    .add_tenant_metric(dimension, EXPORT_FAILURES_METRIC, "getTenant", 1);
                self.metrics.flush();
                Err(e)
            }
        }
    }
}

/// Top-level outcome mapping: every stage failure collapses to one of the
/// two coarse response constants; the detailed cause is only logged.
pub async fn handle(
    executor: &Executor,
    event: &ExportEvent,
) -> std::result::Result<ExportResponse, &'static str> {
    match executor.run(event).await {
        Ok(response) => Ok(response),
        Err(e) => {
            error!("export failed: {e}");
            Err(e.outcome())
        }
    }
}
