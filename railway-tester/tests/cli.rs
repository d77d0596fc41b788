use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "railway-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_railway-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("offscreen-target"));
}

#[test]
fn cli_runs_selected_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_railway-tester");
    let output_path = temp_path("run");
    let status = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "walkthrough,missing-target",
            "--settle-ms",
            "5",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let entries = report.as_array().expect("array of results");
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry["passed"] == true));
}

#[test]
fn cli_skips_unknown_scenarios() {
    let exe = env!("CARGO_BIN_EXE_railway-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "no-such-thing", "--settle-ms", "0"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown scenario: no-such-thing"));
}
