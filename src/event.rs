//! Inbound export event: deserialization, credential extraction and
//! request validation.

use crate::config::{SCHEDULING_UNIT_FILTER, SUPPORTED_REPORT};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// The invocation payload as delivered by the trigger.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportEvent {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
    #[serde(default)]
    pub body: ReportRequest,
}

/// Auth context attached by an upstream authorizer. Present only in the
/// pre-authorized trigger variant.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RequestContext {
    #[serde(default)]
    pub authorizer: Option<Authorizer>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Authorizer {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub report_name: String,
    #[serde(default)]
    pub report_date_range: Option<DateRange>,
    #[serde(default)]
    pub query: Vec<FilterClause>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterClause {
    pub filter_name: String,
    #[serde(default)]
    pub values: Vec<FilterValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterValue {
    pub key: String,
}

/// Claims we care about from the bearer token payload. The token is already
/// verified upstream; we only decode it for naming and debug scoping.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TokenClaims {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tenant: String,
}

impl ExportEvent {
    /// Pulls the bearer token from the `Authorization` header, falling back
    /// to a pre-attached authorizer context. Either source yields the same
    /// downstream contract.
    pub fn bearer_token(&self) -> Result<String> {
        if let Some(auth) = self.headers.get("Authorization") {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
            return Err(Error::InvalidCredentials);
        }

        if let Some(token) = self
            .request_context
            .as_ref()
            .and_then(|ctx| ctx.authorizer.as_ref())
            .and_then(|auth| auth.token.clone())
        {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        Err(Error::InvalidCredentials)
    }
}

impl ReportRequest {
    /// Validates the request shape: supported report name, both date bounds
    /// present, non-empty filter list. Pure and deterministic.
    pub fn is_valid(&self) -> bool {
        if self.report_name != SUPPORTED_REPORT {
            return false;
        }
        match &self.report_date_range {
            Some(range) if range.from.is_some() && range.to.is_some() => {}
            _ => return false,
        }
        !self.query.is_empty()
    }

    /// Extracts the scheduling-unit ids from the matching filter clause.
    /// No matching clause means an empty set, which is not an error.
    pub fn scheduling_units(&self) -> Vec<String> {
        self.query
            .iter()
            .find(|clause| clause.filter_name == SCHEDULING_UNIT_FILTER)
            .map(|clause| clause.values.iter().map(|v| v.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Date window for the warehouse query. Only call after `is_valid`.
    pub fn date_window(&self) -> Option<(String, String)> {
        let range = self.report_date_range.as_ref()?;
        Some((range.from.clone()?, range.to.clone()?))
    }
}

/// Decodes the JWT payload segment without verifying the signature. Fails
/// closed: anything that does not look like a JWT yields empty claims.
pub fn decode_token_claims(token: &str) -> TokenClaims {
    let payload = match token.split('.').nth(1) {
        Some(segment) => segment,
        None => return TokenClaims::default(),
    };
    // JWT segments are base64url without padding; tokens in the wild vary,
    // so strip any padding before decoding.
    let normalized = payload.replace('-', "+").replace('_', "/");
    let trimmed = normalized.trim_end_matches('=');
    match STANDARD_NO_PAD.decode(trimmed) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            debug!("token payload is not valid JSON: {e}");
            TokenClaims::default()
        }),
        Err(e) => {
            debug!("token payload is not valid base64: {e}");
            TokenClaims::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> ReportRequest {
        ReportRequest {
            report_name: SUPPORTED_REPORT.to_string(),
            report_date_range: Some(DateRange {
                from: Some("2020-04-01".into()),
                to: Some("2020-04-05".into()),
            }),
            query: vec![FilterClause {
                filter_name: SCHEDULING_UNIT_FILTER.to_string(),
                values: vec![FilterValue { key: "su-1".into() }],
            }],
        }
    }

    #[test]
    fn extracts_token_from_authorization_header() {
        let mut event = ExportEvent::default();
        event
            .headers
            .insert("Authorization".into(), "Bearer abc.def.ghi".into());
        assert_eq!(event.bearer_token().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_authorization() {
        let event = ExportEvent::default();
        assert!(matches!(
            event.bearer_token(),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn rejects_malformed_authorization() {
        let mut event = ExportEvent::default();
        event
            .headers
            .insert("Authorization".into(), "Basic abc".into());
        assert!(matches!(
            event.bearer_token(),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn falls_back_to_authorizer_context() {
        let event = ExportEvent {
            request_context: Some(RequestContext {
                authorizer: Some(Authorizer {
                    token: Some("ctx-token".into()),
                }),
            }),
            ..Default::default()
        };
        assert_eq!(event.bearer_token().unwrap(), "ctx-token");
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_request().is_valid());
    }

    #[test]
    fn wrong_report_name_fails() {
        let mut request = valid_request();
        request.report_name = "adherenceV1".into();
        assert!(!request.is_valid());
    }

    #[test]
    fn incomplete_date_range_fails() {
        let mut request = valid_request();
        request.report_date_range = Some(DateRange {
            from: Some("2020-04-01".into()),
            to: None,
        });
        assert!(!request.is_valid());

        request.report_date_range = None;
        assert!(!request.is_valid());
    }

    #[test]
    fn empty_filter_list_fails() {
        let mut request = valid_request();
        request.query.clear();
        assert!(!request.is_valid());
    }

    #[test]
    fn scheduling_units_flatten_value_keys() {
        let mut request = valid_request();
        request.query = vec![
            FilterClause {
                filter_name: "agents".into(),
                values: vec![FilterValue { key: "u-9".into() }],
            },
            FilterClause {
                filter_name: SCHEDULING_UNIT_FILTER.to_string(),
                values: vec![
                    FilterValue { key: "su-1".into() },
                    FilterValue { key: "su-2".into() },
                ],
            },
        ];
        assert_eq!(request.scheduling_units(), vec!["su-1", "su-2"]);
    }

    #[test]
    fn missing_scheduling_unit_clause_yields_empty_set() {
        let mut request = valid_request();
        request.query = vec![FilterClause {
            filter_name: "agents".into(),
            values: vec![FilterValue { key: "u-9".into() }],
        }];
        assert!(request.scheduling_units().is_empty());
    }

    #[test]
    fn decodes_jwt_payload_claims() {
        // {"name":"pm.kepler.administrator@wfosaas.com","tenant":"perm_pm_kepler"}
        let payload = STANDARD_NO_PAD.encode(
            r#"{"name":"pm.kepler.administrator@wfosaas.com","tenant":"perm_pm_kepler"}"#,
        );
        let token = format!("header.{payload}.sig");
        let claims = decode_token_claims(&token);
        assert_eq!(claims.name, "pm.kepler.administrator@wfosaas.com");
        assert_eq!(claims.tenant, "perm_pm_kepler");
    }

    #[test]
    fn garbage_token_yields_empty_claims() {
        let claims = decode_token_claims("not-a-jwt");
        assert!(claims.name.is_empty());
        assert!(claims.tenant.is_empty());
    }
}
