//! End-to-end tests for the tqec-pack command line.

use std::fs;
use std::path::Path;
use std::process::Command;
use tqec_pack_cli::{DocumentParser, ParseError};
use tqec_pack_core::{CompactionResult, Config, SaConfig};
use tqec_pack_layout::{Compaction, ModuleFactory};

const DOCUMENT: &str = r#"{
    "loops": [
        { "id": 0, "type": "primal", "cross": [1, 2], "pins": 1, "caps": 1 },
        { "id": 1, "type": "dual", "cross": [0], "pins": 0, "caps": 0 },
        { "id": 2, "type": "dual", "cross": [0], "pins": 2, "caps": 0 }
    ]
}"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tqec-pack"))
}

#[test]
fn test_parse_and_compact() {
    let loops = DocumentParser::new().parse_json(DOCUMENT).unwrap();
    let mut modules = ModuleFactory::new().create_all(&loops);
    let config = Config::default().with_sa(
        SaConfig::default()
            .with_iterations_per_temp(50)
            .with_cooling_rate(0.8)
            .with_seed(8),
    );

    let result = Compaction::new(config).execute(&mut modules).unwrap();
    assert_eq!(result.placements.len(), 3);
    assert!(result.final_cost <= result.initial_cost);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default().with_seed(42).with_candidate_validation(true);
    let path = write(
        dir.path(),
        "config.json",
        &serde_json::to_string(&config).unwrap(),
    );

    let loaded = DocumentParser::new().parse_config(&path).unwrap();
    assert_eq!(loaded, config);

    let bad = write(
        dir.path(),
        "bad.json",
        r#"{ "sa": { "cooling_rate": 2.0 } }"#,
    );
    assert!(matches!(
        DocumentParser::new().parse_config(&bad),
        Err(ParseError::MalformedInput(_))
    ));
}

#[test]
fn test_inspect_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "loops.json", DOCUMENT);

    let output = binary().arg("inspect").arg(&input).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- loop 2 ---"));
    assert!(stdout.contains("--- 2 ---"));
}

#[test]
fn test_run_command_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "loops.json", DOCUMENT);
    let out = dir.path().join("result.json");

    let status = binary()
        .args(["-q", "run"])
        .arg(&input)
        .args(["--seed", "3", "--trials", "40", "--cooling-rate", "0.7"])
        .arg("--output")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let result: CompactionResult =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(result.placements.len(), 3);
    assert_eq!(result.stages, vec!["relocation"]);
}

#[test]
fn test_run_rejects_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "bad.json",
        r#"{ "loops": [ { "id": 0, "type": "primal", "cross": [5], "pins": 0, "caps": 0 } ] }"#,
    );

    let output = binary().args(["-q", "run"]).arg(&input).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown loop 5"));
}
