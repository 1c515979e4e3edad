//! Integration tests for output formatting
//!
//! These run the `geosight` binary on commands that never leave the process
//! and check the JSON envelope and exit codes.

use std::path::Path;
use std::process::{Command, Output};

const ENV_VARS: &[&str] = &[
    "GEOSIGHT_WMS_BASE_URL",
    "GEOSIGHT_ANALYSIS_API_URL",
    "GEOSIGHT_PERSISTENCE_API_URL",
    "GEOSIGHT_GEOCODER_URL",
    "GEOSIGHT_USER_AGENT",
    "GEOSIGHT_DEFAULT_CLOUD_CEILING",
    "GEOSIGHT_REQUEST_TIMEOUT_SECS",
];

fn geosight(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_geosight"));
    command.current_dir(dir).args(args).env("RUST_LOG", "error");
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command.output().expect("Failed to execute command")
}

fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_overlay_json_output_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let output = geosight(
        dir.path(),
        &[
            "overlay", "--json", "--bbox", "-1.5,36.0,-1.0,36.5", "--layer", "NDVI", "--start",
            "2024-01-01", "--end", "2024-02-01", "--cloud", "30",
        ],
    );
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    assert_eq!(parsed["status"], "success");
    let url = parsed["data"]["url"].as_str().expect("Should have url field");
    assert!(url.contains("LAYERS=NDVI-L2A"));
    assert!(url.contains("BBOX=-1.5,36,-1,36.5"));
    assert!(url.contains("TIME=2024-01-01T00:00:00Z/2024-02-01T00:00:00Z"));
    assert!(url.ends_with("MAXCC=30"));
    assert_eq!(parsed["data"]["cloud_coverage"], "30%");
}

#[test]
fn test_overlay_uses_configured_cloud_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("geosight.toml"), "default_cloud_ceiling = 45\n").unwrap();

    let output = geosight(
        dir.path(),
        &[
            "overlay", "--json", "--bbox", "0,0,1,1", "--layer", "TRUE_COLOR", "--start",
            "2024-03-01", "--end", "2024-03-10",
        ],
    );
    assert!(output.status.success(), "Command should succeed");
    assert_eq!(parse_json(&output)["data"]["cloud_coverage"], "45%");
}

#[test]
fn test_invalid_request_fails_before_any_network_call() {
    let dir = tempfile::tempdir().unwrap();
    let output = geosight(
        dir.path(),
        &[
            "overlay", "--bbox", "0,0,1,1", "--layer", "NDVI", "--start", "2024-01-01", "--end",
            "2024-02-01", "--cloud", "150",
        ],
    );

    assert!(!output.status.success(), "Out-of-range cloud ceiling should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid request"), "stderr: {}", stderr);
}

#[test]
fn test_config_reports_sources() {
    let dir = tempfile::tempdir().unwrap();
    let output = geosight(
        dir.path(),
        &["config", "--json", "--analysis-url", "http://localhost:5000/"],
    );
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    let rows = parsed["data"].as_array().expect("data should be a list");
    assert_eq!(rows.len(), 7);

    let analysis = rows
        .iter()
        .find(|row| row["key"] == "analysis_api_url")
        .expect("analysis_api_url should be listed");
    assert_eq!(analysis["value"], "http://localhost:5000");
    assert_eq!(analysis["source"], "Cli");

    let geocoder = rows.iter().find(|row| row["key"] == "geocoder_url").unwrap();
    assert_eq!(geocoder["source"], "Default");
}

#[test]
fn test_layers_lists_every_layer() {
    let dir = tempfile::tempdir().unwrap();
    let output = geosight(dir.path(), &["layers", "--json"]);
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    let rows = parsed["data"].as_array().unwrap();
    assert_eq!(rows.len(), 11);
    assert!(rows
        .iter()
        .any(|row| row["overlay_id"] == "MOISTURE_INDEX" && row["statistics_index"] == "NDMI"));
}
