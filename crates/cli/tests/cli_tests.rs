//! CLI integration tests

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run `hm` isolated from the caller's environment and config file
fn hm(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hm"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("AZURE_SUBSCRIPTION_ID")
        .env_remove("AZURE_RESOURCE_GROUP")
        .env_remove("HEALTH_MODEL_NAME")
        .env_remove("AZURE_AUTH_TOKEN")
        .env_remove("HM_API_URL")
        .env_remove("HM_MODEL_FILE")
        .env_remove("HM_SNAPSHOT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn write_snapshot(dir: &Path) -> String {
    let path = dir.join("snapshot.json");
    let snapshot = serde_json::json!({
        "ecommerce-root": {
            "entity_id": "ecommerce-root",
            "state": "Degraded",
            "details": { "kind": "System_HealthModelRoot", "displayName": "E-Commerce Workload" }
        },
        "api-service": { "entity_id": "api-service", "state": "Healthy" },
        "payment-service": { "entity_id": "payment-service", "state": "Unhealthy" }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = hm(home.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("health models"), "Should show about text");
    for command in ["status", "summary", "impact", "critical-path", "report", "model"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = hm(home.path(), &["--version"]);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("hm"));
}

#[test]
fn test_impact_json_from_sample() {
    let home = TempDir::new().unwrap();
    let output = hm(
        home.path(),
        &["--sample", "ecommerce", "impact", "payment-service", "-f", "json"],
    );
    assert!(output.status.success());

    let impact = stdout_json(&output);
    assert_eq!(impact["failed_entity"], "payment-service");
    assert_eq!(impact["impact_severity"], "critical");
    assert_eq!(impact["affected_services"][0]["id"], "order-service");
    assert_eq!(impact["affected_services"].as_array().unwrap().len(), 1);
}

#[test]
fn test_critical_path_json() {
    let home = TempDir::new().unwrap();
    let output = hm(
        home.path(),
        &["critical-path", "--start", "api-service", "--format", "json"],
    );
    assert!(output.status.success());

    let path: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        path,
        vec![
            "api-service",
            "product-service",
            "product-db",
            "order-service",
            "payment-service",
            "order-db",
            "service-bus",
        ]
    );
}

#[test]
fn test_critical_path_unknown_start_is_single_entry() {
    let home = TempDir::new().unwrap();
    let output = hm(home.path(), &["critical-path", "-f", "json"]);
    assert!(output.status.success());

    let path: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(path, vec!["root"]);
}

#[test]
fn test_model_export_then_validate() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("model.json");
    let file = file.to_str().unwrap();

    let export = hm(home.path(), &["--sample", "microservices", "model", "export", "-o", file]);
    assert!(export.status.success());
    assert!(String::from_utf8_lossy(&export.stdout).contains("exported"));

    let validate = hm(home.path(), &["model", "validate", file, "-f", "json"]);
    assert!(validate.status.success());
    let result = stdout_json(&validate);
    assert_eq!(result["valid"], true);
    assert_eq!(result["entities"], 4);
    assert_eq!(result["dependencies"], 0);

    let impact = hm(home.path(), &["--model-file", file, "impact", "user-service", "-f", "json"]);
    assert!(impact.status.success());
    assert_eq!(stdout_json(&impact)["impact_severity"], "low");
}

#[test]
fn test_validate_rejects_broken_document() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();

    let output = hm(home.path(), &["model", "validate", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid model"));
}

#[test]
fn test_summary_from_snapshot() {
    let home = TempDir::new().unwrap();
    let snapshot = write_snapshot(home.path());

    let output = hm(home.path(), &["--snapshot", &snapshot, "summary", "-f", "json"]);
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["total_entities"], 3);
    assert_eq!(summary["unhealthy_count"], 1);

    let output = hm(
        home.path(),
        &["--snapshot", &snapshot, "summary", "--complete", "-f", "json"],
    );
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["total_entities"], 9);
    assert_eq!(summary["unknown_count"], 6);
    assert_eq!(summary["healthy_count"], 1);
}

#[test]
fn test_status_from_snapshot_prefers_workload_root() {
    let home = TempDir::new().unwrap();
    let snapshot = write_snapshot(home.path());

    let output = hm(home.path(), &["--snapshot", &snapshot, "status", "-f", "json"]);
    assert!(output.status.success());
    let record = stdout_json(&output);
    assert_eq!(record["entity_id"], "ecommerce-root");
    assert_eq!(record["state"], "Degraded");
    assert_eq!(record["state_color"], "amber");
}

#[test]
fn test_timeline_rejects_bad_windows() {
    let home = TempDir::new().unwrap();
    let snapshot = write_snapshot(home.path());

    for hours in ["0", "-5", "9223372036854775", "4294967295"] {
        let arg = format!("--hours={}", hours);
        let output = hm(
            home.path(),
            &["--snapshot", &snapshot, "timeline", "api-service", &arg, "-f", "json"],
        );
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert!(!output.status.success(), "--hours {} should fail", hours);
        assert!(!stderr.contains("panicked"), "--hours {} panicked: {}", hours, stderr);
    }

    let output = hm(
        home.path(),
        &["--snapshot", &snapshot, "timeline", "api-service", "--hours=4294967295"],
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
}

#[test]
fn test_timeline_from_snapshot_is_empty() {
    let home = TempDir::new().unwrap();
    let snapshot = write_snapshot(home.path());

    let output = hm(
        home.path(),
        &["--snapshot", &snapshot, "timeline", "api-service", "--hours", "48", "-f", "json"],
    );
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn test_status_without_api_settings_fails() {
    let home = TempDir::new().unwrap();
    let output = hm(home.path(), &["status"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--subscription-id"));
}

#[test]
fn test_config_file_supplies_model() {
    let home = TempDir::new().unwrap();
    let model = home.path().join("model.json");
    let model_path = model.to_str().unwrap();
    let export = hm(home.path(), &["--sample", "microservices", "model", "export", "-o", model_path]);
    assert!(export.status.success());

    let config_dir = home.path().join(".config").join("hm");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.json"),
        serde_json::json!({ "model_file": model_path }).to_string(),
    )
    .unwrap();

    let output = hm(home.path(), &["model", "show", "-f", "json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("platform-root"));
    assert!(!stdout.contains("ecommerce-root"));
}
