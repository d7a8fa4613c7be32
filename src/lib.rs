//! # Adherence Export
//!
//! Exports WFM adherence reports from the Snowflake data lake: authenticate
//! the caller against the CXone identity API, gate on the WFM license and
//! the export feature toggle, validate the report request, resolve the
//! tenant's users, query the warehouse, render CSV, upload to S3 and return
//! a short-lived retrieval URL.
//!
//! ## Modules
//!
//! - `config` - Invocation configuration, read once from the environment
//! - `cxone` - CXone identity, feature-toggle and user-hub API client
//! - `event` - Inbound event parsing, credential extraction and validation
//! - `executor` - The linear gate pipeline and outcome classification
//! - `metrics` - Tenant-dimension failure metrics
//! - `report` - CSV rendering and report file naming
//! - `secrets` - Warehouse credential retrieval
//! - `storage` - Data-lake upload and presigned retrieval URLs
//! - `warehouse` - Snowflake adherence query and session lifecycle

pub mod config;
pub mod cxone;
pub mod error;
pub mod event;
pub mod executor;
pub mod metrics;
pub mod report;
pub mod secrets;
pub mod storage;
pub mod warehouse;

pub use error::{Error, Result};
