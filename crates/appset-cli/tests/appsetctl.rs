//! Runs the `appsetctl` binary against files on disk.

use std::io::Write;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn appsetctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_appsetctl"))
        .args(args)
        .env_remove("ARGOCD_SERVER_VERSION")
        .env_remove("APPSET_STRICT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn json_file(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{value}").unwrap();
    file
}

fn raw_config() -> Value {
    json!({"spec": [{
        "generator": [{"matrix": [{"generator": [
            {"git": [{"repo_url": "https://example.com/apps.git", "revision": "HEAD", "directory": [{"path": "apps/*", "exclude": false}]}]},
            {"clusters": [{"enabled": true, "selector": [{"match_labels": {"env": "prod"}}]}]},
        ]}]}],
        "go_template": false,
        "template": [{"metadata": [{"name": "{{path.basename}}"}]}],
    }]})
}

#[test]
fn expand_then_flatten() {
    let raw = raw_config();
    let input = json_file(&raw);
    let expanded = appsetctl(&["expand", input.path().to_str().unwrap()]);
    assert!(expanded.status.success(), "{}", String::from_utf8_lossy(&expanded.stderr));
    let wire: Value = serde_json::from_slice(&expanded.stdout).unwrap();
    assert_eq!(
        wire["generators"][0]["matrix"]["generators"][0]["git"]["repoURL"],
        json!("https://example.com/apps.git")
    );

    let spec = json_file(&wire);
    let flattened = appsetctl(&["flatten", spec.path().to_str().unwrap()]);
    assert!(flattened.status.success(), "{}", String::from_utf8_lossy(&flattened.stderr));
    let back: Value = serde_json::from_slice(&flattened.stdout).unwrap();
    assert_eq!(back, raw);
}

#[test]
fn old_server_rejects_multiple_sources() {
    let input = json_file(&json!({"spec": [{
        "generator": [{"clusters": [{"enabled": true}]}],
        "template": [{"spec": [{"source": [
            {"repo_url": "https://example.com/a.git"},
            {"repo_url": "https://example.com/b.git"},
        ]}]}],
    }]}));
    let output = appsetctl(&[
        "--server-version",
        "v2.7.2",
        "expand",
        input.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2.8.0"), "{stderr}");
}

#[test]
fn features_for_version() {
    let output = appsetctl(&["features", "--server-version", "2.9.0"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("server version: 2.9.0"));
    assert_eq!(stdout.matches(" supported").count(), 4);
    assert_eq!(stdout.matches("unsupported").count(), 1);
}
