//! CLI tests for `tot-engine` commands.
//!
//! Spawns the binary and verifies exit codes and stdout for replay,
//! validation, config initialization and the guide.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tot_engine::exit_codes;
use tot_engine::io::config::{EngineConfig, load_config};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tot_engine(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tot-engine"))
        .args(args)
        .output()
        .expect("spawn tot-engine")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn replay_regular_session_prints_best_path() {
    let script = fixture("regular_session.json");
    let output = tot_engine(&["replay", script.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let json = stdout_json(&output);
    assert_eq!(json["result"]["kind"], "answer");
    assert_eq!(
        json["result"]["final_answer"],
        "Size-tiered compaction with daily segments"
    );
    assert_eq!(json["result"]["path_length"], 2);
    assert_eq!(json["summary"]["node_count"], 4);
    assert_eq!(json["rounds"].as_array().expect("rounds").len(), 2);
}

#[test]
fn replay_enforced_short_session_exits_with_gate_code() {
    let script = fixture("enforced_short.json");
    let output = tot_engine(&["replay", script.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::ENFORCEMENT_NOT_MET));

    let json = stdout_json(&output);
    assert_eq!(json["result"]["kind"], "enforcement_not_met");
    assert_eq!(json["result"]["nodes_created"], 4);
    assert_eq!(json["result"]["min_required"], 16);
}

#[test]
fn replay_markdown_renders_report() {
    let script = fixture("regular_session.json");
    let output = tot_engine(&[
        "replay",
        script.to_str().expect("utf-8 path"),
        "--format",
        "markdown",
    ]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let report = String::from_utf8(output.stdout).expect("utf-8");
    assert!(report.starts_with("# Exploration report"));
    assert!(report.contains("**Final answer:** Size-tiered compaction with daily segments"));
}

#[test]
fn replay_uses_config_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("engine.toml");
    fs::write(&config, "[scoring]\nprogress_weight = 2.0\n").expect("write config");

    let script = fixture("regular_session.json");
    let output = tot_engine(&[
        "replay",
        script.to_str().expect("utf-8 path"),
        "--config",
        config.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("engine.toml"), "{stderr}");
}

#[test]
fn validate_reports_schema_errors() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = temp.path().join("bad.json");
    let raw = fs::read_to_string(fixture("regular_session.json")).expect("read fixture");
    fs::write(&script, raw.replace("\"risk_estimate\": 0.2", "\"risk_estimate\": 1.5"))
        .expect("write script");

    let output = tot_engine(&["validate", script.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schema validation failed"), "{stderr}");

    let output = tot_engine(&["validate", fixture("regular_session.json").to_str().expect("utf-8")]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn init_config_writes_defaults_and_refuses_overwrite() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("engine.toml");
    let path_arg = path.to_str().expect("utf-8 path");

    let output = tot_engine(&["init-config", path_arg]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&path).expect("load"), EngineConfig::default());

    let output = tot_engine(&["init-config", path_arg]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));

    let output = tot_engine(&["init-config", path_arg, "--force"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn guide_lists_levels_and_single_level() {
    let output = tot_engine(&["guide"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let json = stdout_json(&output);
    let levels = json["levels"].as_array().expect("levels");
    assert_eq!(levels.len(), 4);
    assert_eq!(levels[0]["level"], "shallow");
    assert_eq!(levels[3]["node_budget"], 500);

    let output = tot_engine(&["guide", "--level", "moderate"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let json = stdout_json(&output);
    assert_eq!(json["min_required"], 43);
}
