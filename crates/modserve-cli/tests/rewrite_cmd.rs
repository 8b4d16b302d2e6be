//! Integration tests for `modserve rewrite`, `modserve resolve` and startup
//! configuration errors.

use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "modserve-cli", "--bin", "modserve", "--"]);
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A project with `lit-element` installed and one app module importing it.
fn create_project(root: &Path) {
    write(
        root,
        "node_modules/lit-element/package.json",
        r#"{"name": "lit-element", "main": "lit-element.cjs.js", "module": "lit-element.js"}"#,
    );
    write(root, "node_modules/lit-element/lit-element.cjs.js", "");
    write(root, "node_modules/lit-element/lit-element.js", "");
    write(
        root,
        "src/app.js",
        "import {html} from 'lit-element';\nimport x from 'nonexistent-package';\nconsole.log(html, x);\n",
    );
}

#[test]
#[serial]
fn test_rewrite_prints_rewritten_source() {
    let dir = tempdir().unwrap();
    create_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["rewrite", "src/app.js"])
        .output()
        .expect("Failed to run modserve rewrite");

    assert!(
        output.status.success(),
        "rewrite should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "import {html} from '../node_modules/lit-element/lit-element.js';\nimport x from 'nonexistent-package';\nconsole.log(html, x);\n"
    );

    // Unresolvable specifiers are reported, not fatal
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("nonexistent-package"),
        "failure should be logged. stderr: {stderr}"
    );
}

#[test]
#[serial]
fn test_rewrite_json_lists_failures() {
    let dir = tempdir().unwrap();
    create_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "rewrite", "src/app.js"])
        .output()
        .expect("Failed to run modserve rewrite");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");

    assert!(json["code"]
        .as_str()
        .unwrap()
        .contains("'../node_modules/lit-element/lit-element.js'"));

    let failures = json["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["specifier"], "nonexistent-package");
    assert_eq!(failures[0]["line"], 2);
    assert_eq!(failures[0]["reason"], "NOT_FOUND");
}

#[test]
#[serial]
fn test_resolve_success_and_failure() {
    let dir = tempdir().unwrap();
    create_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["resolve", "lit-element", "--from", "node_modules/lit-element/demo.js"])
        .output()
        .expect("Failed to run modserve resolve");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "./lit-element.js");

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "resolve", "nonexistent-package", "--from", "src/app.js"])
        .output()
        .expect("Failed to run modserve resolve");

    assert!(!output.status.success());

    let json: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
            .expect("stdout should be valid JSON");
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "NOT_FOUND");
    assert!(!json["tried"].as_array().unwrap().is_empty());
}

#[test]
#[serial]
fn test_resolve_keeps_urls() {
    let dir = tempdir().unwrap();

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["resolve", "https://unpkg.com/lit?module", "--from", "app.js"])
        .output()
        .expect("Failed to run modserve resolve");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "https://unpkg.com/lit?module"
    );
}

#[test]
#[serial]
fn test_serve_without_paths_fails_at_startup() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("modserve.json"), r#"{"baseDir": "app"}"#).unwrap();

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["serve", "--port", "0"])
        .output()
        .expect("Failed to run modserve serve");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("paths"),
        "error should name the missing key. stderr: {stderr}"
    );
}

#[test]
#[serial]
fn test_version() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run modserve version");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("modserve "));
}
