use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn pymetrics() -> Command {
    let mut cmd = Command::cargo_bin("pymetrics").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn json_output(args: &[&str]) -> Value {
    let output = pymetrics().args(args).output().expect("command runs");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

// ---------------------------------------------------------------------------
// CLI smoke tests
// ---------------------------------------------------------------------------

#[test]
fn test_help_output() {
    pymetrics()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Python projects"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn test_version_output() {
    pymetrics()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pymetrics"));
}

#[test]
fn test_missing_path_fails() {
    pymetrics()
        .args(["-p", "/nonexistent/pymetrics/project", "complexity"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_explicit_config_fails() {
    pymetrics()
        .args(["-p", &fixture("simple"), "-c", "/nonexistent/pymetrics.toml", "complexity"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

// ---------------------------------------------------------------------------
// Per-analyzer commands
// ---------------------------------------------------------------------------

#[test]
fn test_complexity_single_function() {
    let json = json_output(&["-p", &fixture("simple"), "-f", "json", "complexity"]);
    assert_eq!(json["total_files"], 1);
    assert_eq!(json["total_functions"], 1);
    assert_eq!(json["max_cyclomatic"], 1);
}

#[test]
fn test_quality_single_function_is_undocumented() {
    let json = json_output(&["-p", &fixture("simple"), "-f", "json", "quality", "--no-coverage"]);
    assert_eq!(json["documentation_coverage"].as_f64(), Some(0.0));
    assert_eq!(json["test_coverage"].as_f64(), Some(0.0));
}

#[test]
fn test_security_clean_file() {
    let json = json_output(&["-p", &fixture("simple"), "-f", "json", "security"]);
    assert_eq!(json["vulnerabilities"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_security_os_system() {
    let json = json_output(&["-p", &fixture("unsafe"), "-f", "json", "security"]);
    let vulns = json["vulnerabilities"].as_array().expect("vulnerability list");
    assert_eq!(vulns.len(), 1);
    let severity = vulns[0]["severity"].as_str().unwrap_or_default();
    assert!(severity == "critical" || severity == "high", "severity was {severity}");
    assert!(vulns[0]["description"].as_str().unwrap_or_default().contains("os.system"));
    assert_eq!(json["severity_distribution"]["critical"], 1);
}

#[test]
fn test_performance_runs() {
    let json = json_output(&["-p", &fixture("simple"), "-f", "json", "performance"]);
    let score = json["performance_score"].as_f64().expect("score");
    assert!((0.0..=100.0).contains(&score));
}

#[test]
fn test_patterns_singleton() {
    let json = json_output(&["-p", &fixture("singleton"), "-f", "json", "patterns"]);
    let patterns = json["design_patterns"].as_array().expect("pattern list");
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0]["pattern"], "Singleton");
    assert_eq!(json["architectural_style"]["name"], "Layered");
}

#[test]
fn test_deps_cycle() {
    let json = json_output(&["-p", &fixture("cycle"), "-f", "json", "deps", "--no-health"]);
    assert_eq!(json["cycles"], serde_json::json!([["a", "b"]]));
    assert!(json.get("health").is_none());
}

#[test]
fn test_deps_absolute_package_cycle() {
    let json = json_output(&["-p", &fixture("package_cycle"), "-f", "json", "deps", "--no-health"]);
    assert_eq!(json["cycles"], serde_json::json!([["pkg.a", "pkg.b"]]));
    assert_eq!(json["external_modules"], serde_json::json!([]));
}

#[test]
fn test_markdown_output() {
    pymetrics()
        .args(["-p", &fixture("unsafe"), "-f", "markdown", "security"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Vulnerabilities"));
}

// ---------------------------------------------------------------------------
// Full analysis
// ---------------------------------------------------------------------------

#[test]
fn test_analyze_json() {
    let json = json_output(&[
        "-p",
        &fixture("cycle"),
        "-f",
        "json",
        "analyze",
        "--no-coverage",
        "--no-health",
    ]);
    let metrics = &json["metrics"];
    assert_eq!(metrics["total_files"], 2);
    assert_eq!(metrics["dependency"]["cycles"].as_array().map(Vec::len), Some(1));
    let score = metrics["overall_score"].as_f64().expect("overall score");
    assert!((0.0..=100.0).contains(&score));
    assert!(["A", "B", "C", "D", "F"].contains(&metrics["grade"].as_str().unwrap_or_default()));

    let recommendations = json["recommendations"].as_array().expect("recommendations");
    assert!(recommendations.iter().any(|r| r["category"] == "dependencies"));
    assert!(json["errors"].as_array().is_some_and(|e| e.is_empty()));
}

#[test]
fn test_analyze_critical_vulnerability_ranks_first() {
    let json = json_output(&[
        "-p",
        &fixture("unsafe"),
        "-f",
        "json",
        "analyze",
        "--no-coverage",
        "--no-health",
    ]);
    let first = &json["recommendations"][0];
    assert_eq!(first["priority"], "critical");
    assert_eq!(first["category"], "security");
}

#[test]
fn test_analyze_text_output() {
    pymetrics()
        .args([
            "-p",
            &fixture("simple"),
            "-f",
            "text",
            "--no-color",
            "analyze",
            "--no-coverage",
            "--no-health",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall Score:"))
        .stdout(predicate::str::contains("Recommendations"));
}

#[test]
fn test_fail_under_exits_nonzero() {
    pymetrics()
        .args([
            "-p",
            &fixture("simple"),
            "-f",
            "json",
            "analyze",
            "--no-coverage",
            "--no-health",
            "--fail-under",
            "101",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("below the minimum"));
}

#[test]
fn test_fail_under_passes_when_met() {
    pymetrics()
        .args([
            "-p",
            &fixture("simple"),
            "-f",
            "json",
            "analyze",
            "--no-coverage",
            "--no-health",
            "--fail-under",
            "0",
        ])
        .assert()
        .success();
}

#[test]
fn test_fail_under_from_config_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("app.py"), "def f(): return 1\n").unwrap();
    fs::write(temp.path().join("pymetrics.toml"), "[score]\nfail_under = 101.0\n").unwrap();
    pymetrics()
        .args(["-p", temp.path().to_str().unwrap(), "-f", "json", "analyze", "--no-coverage", "--no-health"])
        .assert()
        .code(2);
}

// ---------------------------------------------------------------------------
// Health and init
// ---------------------------------------------------------------------------

#[test]
fn test_health_without_manifest_is_degraded() {
    let temp = TempDir::new().unwrap();
    let json = json_output(&["-p", temp.path().to_str().unwrap(), "-f", "json", "health"]);
    assert_eq!(json["degraded"], true);
    assert_eq!(json["cached"], false);
    assert!(!temp.path().join(".pymetrics").exists());
}

#[test]
fn test_init_writes_default_config() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().to_str().unwrap();
    pymetrics()
        .args(["-p", path, "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pymetrics.toml"));
    let written = fs::read_to_string(temp.path().join("pymetrics.toml")).unwrap();
    assert!(written.contains("[score.weights]"));

    pymetrics()
        .args(["-p", path, "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    pymetrics().args(["-p", path, "init", "--force"]).assert().success();
}

#[test]
fn test_written_config_is_loadable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().to_str().unwrap();
    fs::write(temp.path().join("app.py"), "x = 1\n").unwrap();
    pymetrics().args(["-p", path, "init"]).assert().success();
    pymetrics()
        .args(["-p", path, "-f", "json", "complexity"])
        .assert()
        .success();
}
