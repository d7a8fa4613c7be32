//! CSV rendering and report file naming.

use crate::error::{Error, Result};
use crate::event::TokenClaims;
use crate::warehouse::{AdherenceRow, QueryOutcome};
use chrono::Utc;

/// Fixed column labels, in render order.
pub const ADHERENCE_COLUMNS: [&str; 12] = [
    "Agent Name",
    "Time Zone",
    "Published",
    "Scheduling Unit Name",
    "From Date",
    "To Date",
    "From Time",
    "To Time",
    "Scheduled Activity",
    "Actual Activity",
    "In Adherence Duration",
    "Out Of Adherence Duration",
];

/// Renders the fetch outcome as CSV text. The no-data sentinel produces a
/// single header line; otherwise one line per row, values in the fixed
/// field order with no further transformation. Pure given its input.
pub fn render_csv(outcome: &QueryOutcome) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(ADHERENCE_COLUMNS)
        .map_err(|e| Error::Internal(format!("failed to write CSV header: {e}")))?;

    if let QueryOutcome::Rows(rows) = outcome {
        for row in rows {
            writer
                .write_record(row_fields(row))
                .map_err(|e| Error::Internal(format!("failed to write CSV row: {e}")))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV is not UTF-8: {e}")))
}

fn row_fields(row: &AdherenceRow) -> [&str; 12] {
    [
        &row.agent_name,
        &row.time_zone,
        &row.published,
        &row.scheduling_unit_name,
        &row.from_date,
        &row.to_date,
        &row.from_time,
        &row.to_time,
        &row.scheduled_activity,
        &row.actual_activity,
        &row.in_adherence_duration,
        &row.out_of_adherence_duration,
    ]
}

/// Builds the export file name: a UTC timestamp prefix plus the caller's
/// name claim, e.g. `20221007155945_pm.kepler.administrator@wfosaas.com.csv`.
pub fn generate_file_name(claims: &TokenClaims) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    format!("{timestamp}_{}.csv", claims.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(agent: &str) -> AdherenceRow {
        AdherenceRow {
            agent_name: agent.into(),
            time_zone: "America/New_York".into(),
            published: "true".into(),
            scheduling_unit_name: "Inbound".into(),
            from_date: "2020-04-01".into(),
            to_date: "2020-04-01".into(),
            from_time: "09:00".into(),
            to_time: "17:00".into(),
            scheduled_activity: "Phone".into(),
            actual_activity: "Available".into(),
            in_adherence_duration: "07:30".into(),
            out_of_adherence_duration: "00:30".into(),
        }
    }

    #[test]
    fn no_data_renders_header_only() {
        let csv = render_csv(&QueryOutcome::NoData).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], ADHERENCE_COLUMNS.join(","));
    }

    #[test]
    fn rows_render_header_plus_one_line_each() {
        let outcome = QueryOutcome::Rows(vec![sample_row("Jane Doe"), sample_row("John Roe")]);
        let csv = render_csv(&outcome).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ADHERENCE_COLUMNS.join(","));
        assert!(lines[1].starts_with("Jane Doe,America/New_York,true,Inbound"));
        assert!(lines[1].ends_with("07:30,00:30"));
        assert!(lines[2].starts_with("John Roe,"));
    }

    #[test]
    fn file_name_carries_timestamp_prefix_and_name_suffix() {
        let claims = TokenClaims {
            name: "pm.kepler.administrator@wfosaas.com".into(),
            tenant: "perm_pm_kepler".into(),
        };
        let name = generate_file_name(&claims);
        assert!(name.ends_with("_pm.kepler.administrator@wfosaas.com.csv"));
        let prefix = name.split('_').next().unwrap();
        assert_eq!(prefix.len(), 14);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
    }
}
