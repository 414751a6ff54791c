use std::io::Write;
use std::process::{Command, Stdio};

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "xiuxian-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_xiuxian-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("save-version-guard"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_logic_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_xiuxian-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--mode",
            "logic",
            "--report",
            "json",
            "--scenarios",
            "smoke,last-breath",
            "--iterations",
            "1",
            "--seeds",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Xiuxian Automated Tester"));
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(value.as_array().map(Vec::len), Some(2));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_rejects_unknown_strategy() {
    let exe = env!("CARGO_BIN_EXE_xiuxian-tester");
    let output = Command::new(exe)
        .args([
            "--mode",
            "playability",
            "--strategies",
            "lazy",
            "--seeds",
            "1",
        ])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown strategy"));
}

#[test]
fn cli_play_mode_reads_commands_from_stdin() {
    let exe = env!("CARGO_BIN_EXE_xiuxian-tester");
    let save_dir = temp_path("saves");
    let mut child = Command::new(exe)
        .args(["--mode", "play", "--difficulty", "easy", "--name", "Lin", "--seeds", "7"])
        .arg("--save-dir")
        .arg(&save_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn cli");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"meditate\nsave\nquit\n")
        .expect("write commands");
    let output = child.wait_with_output().expect("wait cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lin"));
    assert!(stdout.contains("Saved to slot 'default'."));
    assert!(stdout.contains("Farewell."));
    assert!(save_dir.join("save_slot_default.json").exists());
    let _ = std::fs::remove_dir_all(save_dir);
}
