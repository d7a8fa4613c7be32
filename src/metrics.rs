//! Tenant-dimension failure metrics, aggregated in process and flushed as
//! structured log records.

use std::sync::Mutex;
use tracing::info;

pub const EXPORT_FAILURES_METRIC: &str = "LMBD-WFM-export-failures-D";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub tenant: String,
    pub reason: String,
    pub value: u64,
}

/// Accumulates metric records for the invocation and emits them on flush.
#[derive(Default)]
pub struct MetricsWriter {
    records: Mutex<Vec<MetricRecord>>,
    flushed: Mutex<Vec<MetricRecord>>,
}

impl MetricsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant_metric(&self, tenant: &str, name: &str, reason: &str, value: u64) {
        let mut records = self.records.lock().expect("metrics lock poisoned");
        records.push(MetricRecord {
            name: name.to_string(),
            tenant: tenant.to_string(),
            reason: reason.to_string(),
            value,
        });
    }

    /// Emits all aggregated records and moves them to the flushed history.
    pub fn flush(&self) {
        let mut records = self.records.lock().expect("metrics lock poisoned");
        let mut flushed = self.flushed.lock().expect("metrics lock poisoned");
        for record in records.drain(..) {
            info!(
                metric = %record.name,
                tenant = %record.tenant,
                reason = %record.reason,
                value = record.value,
                "metric"
            );
            flushed.push(record);
        }
    }

    /// Snapshot of the currently buffered records.
    pub fn recorded(&self) -> Vec<MetricRecord> {
        self.records.lock().expect("metrics lock poisoned").clone()
    }

    /// Records emitted by previous flushes.
    pub fn flushed(&self) -> Vec<MetricRecord> {
        self.flushed.lock().expect("metrics lock poisoned").clone()
    }
}
