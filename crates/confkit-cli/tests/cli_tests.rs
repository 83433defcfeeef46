//! Tests that run the compiled `confkit` binary against temporary projects.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A `confkit` command rooted at `dir`, isolated from the user's files
fn confkit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("confkit").expect("Failed to find confkit binary");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".xdg"))
        .env("CONFKIT_ENV_PREFIX", "CONFKIT_TEST_")
        .env_remove("CONFKIT_DIR")
        .env_remove("CONFKIT_PLUGINS")
        .env_remove("RUST_LOG");
    cmd
}

fn project(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("confkit.config.toml"), config).unwrap();
    temp
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    confkit(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    confkit(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confkit"));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolve_json_layers_sources() {
    let temp = project("[server]\nhost = \"localhost\"\nport = 3000\n");
    fs::write(temp.path().join("confkit.local.json"), r#"{"server": {"port": 4000}}"#).unwrap();

    let value = stdout_json(
        confkit(temp.path())
            .args(["resolve", "--json", "--set", "server.debug=true"])
            .env("CONFKIT_TEST_SERVER__HOST", "0.0.0.0"),
    );

    assert_eq!(
        value,
        json!({"server": {"host": "0.0.0.0", "port": 4000, "debug": true}})
    );
}

#[test]
fn test_resolve_with_provenance() {
    let temp = project("[server]\nport = 3000\n");

    let value = stdout_json(
        confkit(temp.path()).args(["resolve", "--json", "--provenance", "-s", "name=\"demo\""]),
    );

    assert_eq!(
        value["provenance"],
        json!({"name": "args", "server.port": "file"})
    );
}

#[test]
fn test_get_prints_bare_strings() {
    let temp = project("[output]\nformat = \"yaml\"\n");
    confkit(temp.path())
        .args(["get", "output.format"])
        .assert()
        .success()
        .stdout("yaml\n");
}

#[test]
fn test_get_missing_value_fails() {
    let temp = project("");
    confkit(temp.path())
        .args(["get", "nothing.here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No value at 'nothing.here'"));
}

// ============================================================================
// Plugins and validation
// ============================================================================

#[test]
fn test_declared_plugins_are_installed() {
    let temp = project("plugins = [\"vite\"]\n");
    confkit(temp.path())
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("vite"))
        .stdout(predicate::str::contains("Available plugins"));
}

#[test]
fn test_plugin_defaults_appear_in_resolution() {
    let temp = project("plugins = [\"vite\"]\n[vite.server]\nport = 8080\n");

    let value = stdout_json(confkit(temp.path()).args(["get", "vite.server", "--json"]));

    assert_eq!(value, json!({"port": 8080, "host": "localhost", "open": false}));
}

#[test]
fn test_validation_errors_are_listed() {
    let temp = project("plugins = [\"prettier\"]\n[prettier]\ntabWidth = \"wide\"\n");
    confkit(temp.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("prettier.tabWidth"))
        .stderr(predicate::str::contains("1 validation error(s)"));
}

#[test]
fn test_validate_data_file_against_schema_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("schema.json"),
        r#"{"type": "object", "properties": {"port": {"type": "integer"}}, "required": ["port"]}"#,
    )
    .unwrap();
    fs::write(temp.path().join("good.yaml"), "port: 80\n").unwrap();
    fs::write(temp.path().join("bad.yaml"), "name: x\n").unwrap();

    confkit(temp.path())
        .args(["validate", "--schema", "schema.json", "good.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
    confkit(temp.path())
        .args(["validate", "--schema", "schema.json", "bad.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("port"));
}

#[test]
fn test_unknown_plugin_fails() {
    let temp = project("");
    confkit(temp.path())
        .args(["--plugin", "webpack", "plugins"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot load plugin 'webpack'"));
}

#[test]
fn test_remote_plugin_is_rejected() {
    let temp = project("");
    confkit(temp.path())
        .args(["--plugin", "https://example.com/plugin.json", "plugins"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

// ============================================================================
// Set
// ============================================================================

#[test]
fn test_set_preserves_toml_comments() {
    let temp = project("# team defaults\n[server]\nport = 3000 # keep\n");

    confkit(temp.path())
        .args(["set", "server.host", "example.com"])
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join("confkit.config.toml")).unwrap();
    assert!(written.starts_with("# team defaults\n"));
    assert!(written.contains("port = 3000 # keep"));
    assert!(written.contains("host = \"example.com\""));
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_generate_then_check() {
    let temp = project("plugins = [\"prettier\", \"renovate\"]\n[prettier]\nsemi = false\n");

    confkit(temp.path()).arg("generate").assert().success();

    let rc: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(".prettierrc.json")).unwrap())
            .unwrap();
    assert_eq!(rc["semi"], json!(false));
    assert!(temp.path().join("renovate.json").is_file());

    confkit(temp.path())
        .args(["generate", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    confkit(temp.path())
        .args(["generate", "--check", "--set", "prettier.semi=true"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("--- a/.prettierrc.json"))
        .stderr(predicate::str::contains("1 generated file(s) out of date"));
}

#[test]
fn test_generate_renders_typescript() {
    let temp = project("[app]\nname = \"demo\"\n");

    confkit(temp.path())
        .args(["generate", "--output", "config.ts"])
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join("config.ts")).unwrap();
    assert!(written.starts_with("// Generated by confkit. Do not edit.\n"));
    assert!(written.contains("as const;"));
}

#[test]
fn test_generate_to_stdout() {
    let temp = project("[app]\nname = \"demo\"\n");
    confkit(temp.path())
        .args(["generate", "--format", "yaml"])
        .assert()
        .success()
        .stdout("app:\n  name: demo\n");
}
