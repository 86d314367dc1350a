//! Integration tests for the `droidenv` binary.

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Test context with an isolated droidenv home and Termux prefix.
struct TestContext {
    temp_dir: TempDir,
    home: PathBuf,
    prefix: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let home = temp_dir.path().join(".droidenv");
        let prefix = temp_dir.path().join("usr");
        std::fs::create_dir_all(&home).expect("failed to create droidenv home");
        std::fs::create_dir_all(prefix.join("etc/apt")).expect("failed to create prefix");
        Self {
            temp_dir,
            home,
            prefix,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_droidenv"));
        cmd.env("HOME", self.temp_dir.path())
            .env("DROIDENV_HOME", &self.home)
            .env("PREFIX", &self.prefix)
            .env_remove("DROIDENV_REGION")
            .env_remove("DROIDENV_NONINTERACTIVE");
        cmd
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        self.cmd().args(args).output().expect("failed to run droidenv")
    }
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("setup"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("droidenv "));
}

#[test]
fn test_steps_lists_ids_in_order() {
    let ctx = TestContext::new();
    let output = ctx.run(&["steps"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let positions: Vec<usize> = [
        "select-mirror",
        "upgrade-packages",
        "install-packages",
        "fetch-apps",
    ]
    .iter()
    .map(|id| stdout.find(id).unwrap_or_else(|| panic!("missing {id}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_unknown_step_is_rejected() {
    let ctx = TestContext::new();
    let output = ctx.run(&["setup", "--only", "make-coffee"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("make-coffee"));
}

#[test]
fn test_summary_without_run_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["summary"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No setup run recorded"));
}

#[test]
fn test_summary_json_prints_last_run() {
    let ctx = TestContext::new();
    let doc = r#"{
  "started_at": "2026-01-02T03:04:05Z",
  "finished_at": "2026-01-02T03:05:05Z",
  "total_duration_secs": 60.0,
  "aborted": false,
  "steps": [
    {"id": "select-mirror", "name": "Select package mirror", "status": "success", "duration_secs": 60.0}
  ],
  "counts": {"total": 1, "success": 1, "warning": 0, "error": 0, "skipped": 0}
}"#;
    std::fs::write(ctx.home.join("last-run.json"), doc).unwrap();

    let output = ctx.run(&["summary", "--json"]);
    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["steps"][0]["id"], "select-mirror");

    let output = ctx.run(&["summary"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Select package mirror"));
    assert!(stdout.contains("1 ok"));
}

#[test]
fn test_mirror_list_for_region() {
    let ctx = TestContext::new();
    let output = ctx.run(&["mirror", "list", "--region", "china"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Termux CDN"));
    assert!(stdout.contains("Tsinghua TUNA"));
    assert!(!stdout.contains("Kakao"));
}

#[test]
fn test_mirror_current_reads_sources_list() {
    let ctx = TestContext::new();
    std::fs::write(
        ctx.prefix.join("etc/apt/sources.list"),
        "deb https://mirrors.ustc.edu.cn/termux/apt/termux-main stable main\n",
    )
    .unwrap();

    let output = ctx.run(&["mirror", "current"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("USTC"));
}

#[test]
fn test_invalid_config_is_reported() {
    let ctx = TestContext::new();
    std::fs::write(ctx.home.join("config.toml"), "probe_timeout = 3\n").unwrap();

    let output = ctx.run(&["mirror", "current"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config.toml"));
}
