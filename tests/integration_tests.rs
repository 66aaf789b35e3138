//! Integration tests for the hotel-geosearch CLI

use std::process::Command;

const CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.json");

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hotel-geosearch"))
        .args(["--catalog", CATALOG])
        .args(args)
        // keep user config and environment out of the run
        .args(["--config", "/nonexistent/hotel-geosearch.toml"])
        .env_remove("GEOSEARCH_CACHE__REDIS_URL")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_hotel-geosearch"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hotel-geosearch"));
    assert!(stdout.contains("suggest"));
}

/// Test radius search from the command line
#[test]
fn test_near_command() {
    let output = run(&[
        "near", "--lat", "35.6812", "--lon", "139.7671", "--radius", "2", "--price", "premium",
    ]);
    let hotels = stdout_json(&output);
    let hotels = hotels.as_array().unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0]["hotel_id"], 3);
    assert_eq!(hotels[0]["price_category"], "premium");
}

/// Test that an unknown station is reported, not failed
#[test]
fn test_station_not_found() {
    let output = run(&["station", "424242"]);
    let result = stdout_json(&output);
    assert_eq!(result["status"], "not_found");
    assert_eq!(result["id"], 424242);
}

/// Test autocomplete output ordering
#[test]
fn test_suggest_command() {
    let output = run(&["suggest", "shinjuku"]);
    let suggestions = stdout_json(&output);
    let kinds: Vec<&str> = suggestions
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["locality", "station", "landmark"]);
}

/// Test that an unknown price bracket is rejected by argument parsing
#[test]
fn test_invalid_price_bracket() {
    let output = run(&["near", "--price", "cheap"]);
    assert!(!output.status.success());
}

/// Test missing catalog file
#[test]
fn test_missing_catalog() {
    let output = Command::new(env!("CARGO_BIN_EXE_hotel-geosearch"))
        .args(["--catalog", "/nonexistent/catalog.json", "prices"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load catalog"));
}
