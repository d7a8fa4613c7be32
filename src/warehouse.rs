//! Snowflake adherence data fetcher
//!
//! Builds the tenant-scoped adherence query and runs it over Snowflake's
//! session REST API with an explicit connect/execute/close lifecycle. The
//! session is closed on the same path whether the query succeeded or
//! failed; close errors are logged and non-fatal.

use crate::error::{Error, Result};
use crate::secrets::WarehouseCredentials;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Compute context selected before the report query runs.
const WAREHOUSE_CONTEXT: &str = "USE WAREHOUSE REPORTS_WH;";
const CLIENT_APPLICATION: &str = "WFM-Extract-Service";

/// Inputs accumulated by the earlier pipeline stages.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub tenant_id: String,
    pub scheduling_units: Vec<String>,
    pub user_ids: Vec<String>,
    pub from_date: String,
    pub to_date: String,
}

/// One warehouse record, in the fixed column order the CSV renders.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AdherenceRow {
    pub agent_name: String,
    pub time_zone: String,
    pub published: String,
    pub scheduling_unit_name: String,
    pub from_date: String,
    pub to_date: String,
    pub from_time: String,
    pub to_time: String,
    pub scheduled_activity: String,
    pub actual_activity: String,
    pub in_adherence_duration: String,
    pub out_of_adherence_duration: String,
}

/// Result of the fetch: real rows, or the no-data sentinel. Zero rows and
/// the warehouse's single synthetic marker row both collapse to `NoData`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<AdherenceRow>),
    NoData,
}

/// Renders an identifier set as a quoted SQL `IN` list. Single-member sets
/// become one quoted literal, larger sets a comma-joined quoted list.
pub fn quoted_list(ids: &[String]) -> String {
    if ids.len() > 1 {
        ids.iter()
            .map(|id| format!("'{id}'"))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("'{}'", ids.first().map(String::as_str).unwrap_or(""))
    }
}

/// Builds the adherence report query scoped by tenant, scheduling-unit
/// membership, user membership and the date window.
pub fn build_query(params: &QueryParams) -> String {
    let scheduling_units = quoted_list(&params.scheduling_units);
    let user_ids = quoted_list(&params.user_ids);
    format!(
        "SELECT ag.AGENT_NAME, su.TIME_ZONE, sh.IS_PUBLISHED, su.SCHEDULING_UNIT_NAME, \
         ad.FROM_DATE, ad.TO_DATE, ad.FROM_TIME, ad.TO_TIME, \
         act.SCHEDULED_ACTIVITY, st.ACTUAL_ACTIVITY, \
         ad.IN_ADHERENCE_DURATION, ad.OUT_ADHERENCE_DURATION \
         FROM ADHERENCE_FACT ad \
         JOIN USER_DIM ag ON ad.USER_ID = ag.USER_ID \
         JOIN SCHEDULING_UNIT_DIM su ON ad.SCHEDULING_UNIT_ID = su.SCHEDULING_UNIT_ID \
         JOIN SHIFT_DIM sh ON ad.SHIFT_ID = sh.SHIFT_ID \
         JOIN ACTIVITY_DIM act ON ad.SCHEDULED_ACTIVITY_ID = act.ACTIVITY_ID \
         JOIN AGENT_STATE_DIM st ON ad.AGENT_STATE_ID = st.AGENT_STATE_ID \
         WHERE ad.TENANT_ID = '{tenant}' \
         AND ad.SCHEDULING_UNIT_ID IN ({scheduling_units}) \
         AND ad.USER_ID IN ({user_ids}) \
         AND ad.FROM_DATE >= '{from}' AND ad.TO_DATE <= '{to}';",
        tenant = params.tenant_id,
        from = params.from_date,
        to = params.to_date,
    )
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs the adherence query and returns rows or the no-data sentinel.
    async fn fetch_adherence(
        &self,
        credentials: &WarehouseCredentials,
        params: &QueryParams,
    ) -> Result<QueryOutcome>;
}

pub struct SnowflakeWarehouse {
    client: Client,
}

struct Session {
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    success: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize, Default)]
struct QueryData {
    #[serde(default)]
    rowset: Vec<Vec<Option<String>>>,
}

impl SnowflakeWarehouse {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("failed to create warehouse client: {e}")))?;
        Ok(Self { client })
    }

    async fn open_session(&self, credentials: &WarehouseCredentials) -> Result<Session> {
        let base_url = format!(
            "https://{}.snowflakecomputing.com",
            credentials.account.to_lowercase().replace('_', "-")
        );
        let body = json!({
            "data": {
                "LOGIN_NAME": credentials.username,
                "PASSWORD": credentials.password,
                "ACCOUNT_NAME": credentials.account,
                "CLIENT_APP_ID": CLIENT_APPLICATION,
            }
        });
        let response: LoginResponse = self
            .client
            .post(format!("{base_url}/session/v1/login-request"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::QueryFailure(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::QueryFailure(e.to_string()))?;

        if !response.success {
            return Err(Error::QueryFailure(
                response.message.unwrap_or_else(|| "login rejected".into()),
            ));
        }
        let token = response
            .data
            .ok_or_else(|| Error::QueryFailure("login response missing session data".into()))?
            .token;
        info!("connected to warehouse");
        Ok(Session { base_url, token })
    }

    async fn execute(&self, session: &Session, sql_text: &str) -> Result<QueryResponse> {
        let body = json!({ "sqlText": sql_text });
        self.client
            .post(format!("{}/queries/v1/query-request", session.base_url))
            .header(
                "Authorization",
                format!("Snowflake Token=\"{}\"", session.token),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::QueryFailure(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::QueryFailure(e.to_string()))
    }

    /// Selects the compute context and runs the report query. Query errors
    /// resolve to the no-data sentinel with the warehouse code logged; they
    /// do not abort the invocation.
    async fn run_query(&self, session: &Session, params: &QueryParams) -> QueryOutcome {
        if let Err(e) = self.execute(session, WAREHOUSE_CONTEXT).await {
            warn!("failed to select warehouse context: {e}");
        }

        let sql_text = build_query(params);
        match self.execute(session, &sql_text).await {
            Ok(response) if response.success => {
                let rowset = response.data.unwrap_or_default().rowset;
                if rowset.len() > 1 {
                    QueryOutcome::Rows(rowset.iter().map(|row| row_from_values(row)).collect())
                } else {
                    info!("no rows were returned");
                    QueryOutcome::NoData
                }
            }
            Ok(response) => {
                warn!(
                    code = response.code.as_deref().unwrap_or("unknown"),
                    "statement execution failed: {}",
                    response.message.as_deref().unwrap_or("no message")
                );
                QueryOutcome::NoData
            }
            Err(e) => {
                warn!("error in statement execution: {e}");
                QueryOutcome::NoData
            }
        }
    }

    async fn close_session(&self, session: &Session) {
        let result = self
            .client
            .post(format!("{}/session?delete=true", session.base_url))
            .header(
                "Authorization",
                format!("Snowflake Token=\"{}\"", session.token),
            )
            .send()
            .await;
        match result {
            Ok(_) => info!("disconnected warehouse session"),
            Err(e) => error!("unable to disconnect: {e}"),
        }
    }
}

fn row_from_values(values: &[Option<String>]) -> AdherenceRow {
    let field = |i: usize| -> String {
        values
            .get(i)
            .and_then(|v| v.clone())
            .unwrap_or_default()
    };
    AdherenceRow {
        agent_name: field(0),
        time_zone: field(1),
        published: field(2),
        scheduling_unit_name: field(3),
        from_date: field(4),
        to_date: field(5),
        from_time: field(6),
        to_time: field(7),
        scheduled_activity: field(8),
        actual_activity: field(9),
        in_adherence_duration: field(10),
        out_of_adherence_duration: field(11),
    }
}

#[async_trait]
impl Warehouse for SnowflakeWarehouse {
    async fn fetch_adherence(
        &self,
        credentials: &WarehouseCredentials,
        params: &QueryParams,
    ) -> Result<QueryOutcome> {
        // Connect failure is logged but does not abort the invocation; the
        // report degrades to the no-data sentinel.
        let session = match self.open_session(credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!("unable to connect: {e}");
                return Ok(QueryOutcome::NoData);
            }
        };

        let outcome = self.run_query(&session, params).await;

        // Release the session on success and failure alike.
        self.close_session(&session).await;
        debug!("warehouse fetch complete");
        Ok(outcome)
    }
}
