//! CLI surface tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_export_command() {
    Command::cargo_bin("adherence-export")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export WFM adherence reports"))
        .stdout(predicate::str::contains("--event"));
}

#[test]
fn debug_flag_raises_the_log_level() {
    Command::cargo_bin("adherence-export")
        .unwrap()
        .env("SERVICE_URL", "https://na1.test.example.com")
        .env("DATALAKE_BUCKET", "dev-datalake-cluster-bucket")
        .env("WAREHOUSE_SECRET_ID", "wfm/warehouse")
        .env("DEBUG", "true")
        .env("AWS_REGION", "us-east-1")
        .write_stdin(r#"{"headers": {}, "body": {}}"#)
        .assert()
        .failure()
        .stdout(predicate::str::contains("debug diagnostics enabled"))
        .stderr(predicate::str::contains("Bad Request was provided"));
}

#[test]
fn missing_host_configuration_is_internal_error() {
    Command::cargo_bin("adherence-export")
        .unwrap()
        .env_remove("SERVICE_URL")
        .write_stdin(r#"{"headers": {}, "body": {}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Internal Server Error"));
}
