//! Process-level tests: spawn the real binary through the caller-side invoker

use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use toolrunner::client::ToolInvoker;
use toolrunner::errors::ErrorCode;

const BIN: &str = env!("CARGO_BIN_EXE_toolrunner");

/// Invoker isolated from the developer's home config and credentials
fn invoker(home: &TempDir) -> ToolInvoker {
    ToolInvoker::new(BIN)
        .env("HOME", home.path())
        .env("OPENAI_API_KEY", "")
        .env("TOOLRUNNER_LOG", "off")
        .timeout(Duration::from_secs(30))
}

#[tokio::test]
async fn test_translate_empty_request() {
    let home = TempDir::new().unwrap();
    let invocation = invoker(&home).arg("translate").invoke(&json!({})).await.unwrap();

    assert_eq!(invocation.exit_code, Some(0));
    assert_eq!(invocation.envelope.error().unwrap().code, ErrorCode::InputInvalid);
}

#[tokio::test]
async fn test_empty_stdin_is_empty_object() {
    let home = TempDir::new().unwrap();
    let invocation = invoker(&home)
        .arg("translate")
        .invoke_raw(Vec::new())
        .await
        .unwrap();

    assert_eq!(invocation.exit_code, Some(0));
    assert_eq!(invocation.envelope.error().unwrap().code, ErrorCode::InputInvalid);
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let home = TempDir::new().unwrap();
    let invocation = invoker(&home)
        .arg("sentiment")
        .invoke_raw(b"{\"text\": ".to_vec())
        .await
        .unwrap();

    assert_eq!(invocation.exit_code, Some(0));
    assert_eq!(invocation.envelope.error().unwrap().code, ErrorCode::ParseError);
}

#[tokio::test]
async fn test_sentiment_success() {
    let home = TempDir::new().unwrap();
    let invocation = invoker(&home)
        .arg("sentiment")
        .invoke(&json!({"text": "This is terrible and I hate it"}))
        .await
        .unwrap();

    assert_eq!(invocation.exit_code, Some(0));
    let fields = invocation.envelope.fields().unwrap();
    assert_eq!(fields["label"], "negative");
    assert!(fields["scores"]["compound"].as_f64().unwrap() < 0.0);
}

#[tokio::test]
async fn test_missing_api_key_names_env_var() {
    let home = TempDir::new().unwrap();
    let invocation = invoker(&home)
        .arg("summarize")
        .invoke(&json!({"text": "Some long text"}))
        .await
        .unwrap();

    let error = invocation.envelope.error().unwrap();
    assert_eq!(error.code, ErrorCode::InputInvalid);
    assert_eq!(error.details.as_ref().unwrap()["env"], "OPENAI_API_KEY");
    assert_eq!(invocation.exit_code, Some(0));
}

#[tokio::test]
async fn test_bad_config_is_unexpected() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("broken.toml");
    std::fs::write(&config_path, "[runner\nread_timeout_ms = ").unwrap();

    let invocation = invoker(&home)
        .arg("--config")
        .arg(&config_path)
        .arg("sentiment")
        .invoke(&json!({"text": "fine"}))
        .await
        .unwrap();

    assert_eq!(invocation.exit_code, Some(1));
    assert_eq!(invocation.envelope.error().unwrap().code, ErrorCode::Unexpected);
}

#[tokio::test]
async fn test_open_stdin_hits_read_deadline() {
    let home = TempDir::new().unwrap();
    let mut child = tokio::process::Command::new(BIN)
        .args(["--read-timeout-ms", "200", "sentiment"])
        .env("HOME", home.path())
        .env("TOOLRUNNER_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    // Write a complete request but keep stdin open.
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(br#"{"text": "good"}"#).await.unwrap();
    stdin.flush().await.unwrap();

    let output = tokio::time::timeout(Duration::from_secs(10), child.wait_with_output())
        .await
        .expect("tool exits after the read deadline")
        .unwrap();
    drop(stdin);

    assert_eq!(output.status.code(), Some(0));
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_schema_lists_all_tools() {
    let output = tokio::process::Command::new(BIN)
        .arg("schema")
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
    let schemas: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = schemas.iter().filter_map(|s| s["name"].as_str()).collect();
    assert_eq!(names, ["resize", "scrape", "sentiment", "summarize", "translate"]);
}

#[tokio::test]
async fn test_invoke_subcommand_relays_envelope() {
    let home = TempDir::new().unwrap();
    let output = tokio::process::Command::new(BIN)
        .args(["invoke", "sentiment", "--request", r#"{"text": "I love it"}"#])
        .env("HOME", home.path())
        .env("TOOLRUNNER_LOG", "off")
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(value["label"], "positive");
}
