use thiserror::Error;

/// Coarse user-visible outcome constants. The detailed cause is logged but
/// never returned to the caller.
pub const BAD_REQUEST: &str = "Bad Request was provided";
pub const INTERNAL_ERROR: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid Authorization provided")]
    InvalidCredentials,

    #[error("Failed to validate host")]
    InvalidHost,

    #[error("Tenant authentication failed: {0}")]
    UpstreamAuthFailure(String),

    #[error("Tenant does not have WFM license")]
    LicenseDenied,

    #[error("Export feature toggle is disabled")]
    FeatureDisabled,

    #[error("Invalid filters in request")]
    InvalidRequest,

    #[error("User directory lookup failed: {0}")]
    DirectoryFailure(String),

    #[error("Warehouse query failed: {0}")]
    QueryFailure(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl Error {
    /// Maps a stage failure to the coarse response class: credential and
    /// request-shape problems are the caller's fault, everything else is ours.
    pub fn outcome(&self) -> &'static str {
        match self {
            Error::InvalidCredentials | Error::InvalidRequest => BAD_REQUEST,
            _ => INTERNAL_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_and_request_errors_are_bad_request() {
        assert_eq!(Error::InvalidCredentials.outcome(), BAD_REQUEST);
        assert_eq!(Error::InvalidRequest.outcome(), BAD_REQUEST);
    }

    #[test]
    fn upstream_errors_are_internal() {
        assert_eq!(Error::LicenseDenied.outcome(), INTERNAL_ERROR);
        assert_eq!(Error::FeatureDisabled.outcome(), INTERNAL_ERROR);
        assert_eq!(
            Error::UpstreamAuthFailure("401".into()).outcome(),
            INTERNAL_ERROR
        );
        assert_eq!(Error::InvalidHost.outcome(), INTERNAL_ERROR);
        assert_eq!(
            Error::StorageWriteFailure("denied".into()).outcome(),
            INTERNAL_ERROR
        );
    }
}
