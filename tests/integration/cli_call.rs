use std::process::Command;

use anyhow::Result;
use serde_json::Value;
use tempfile::tempdir;

use crate::common::{mock_leet, BINARY_PATH};

fn call(
    args: &[&str],
    behavior: &str,
    output_dir: &std::path::Path,
) -> Result<std::process::Output> {
    Ok(Command::new(BINARY_PATH)
        .arg("call")
        .args(args)
        .env_clear()
        .env("PATH", "/usr/bin:/bin")
        .env("LEET_HOME", output_dir)
        .env("LEET_EXECUTABLE", mock_leet())
        .env("MOCK_LEET_BEHAVIOR", behavior)
        .env("MCP_CONFIG_PATH", output_dir.join("empty.toml"))
        .current_dir(output_dir)
        .output()?)
}

#[test]
fn list_kb_prints_json_result() -> Result<()> {
    let home = tempdir()?;
    std::fs::write(home.path().join("empty.toml"), "")?;

    let output = call(&["list-kb"], "success", home.path())?;

    assert!(output.status.success(), "{output:?}");
    let payload: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(payload.get("success").and_then(Value::as_bool), Some(true));
    assert_eq!(
        payload
            .get("knowledge_bases")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );
    assert!(home.path().join("mcp_outputs").is_dir());
    Ok(())
}

#[test]
fn failed_call_prints_structured_error_and_exits_one() -> Result<()> {
    let home = tempdir()?;
    std::fs::write(home.path().join("empty.toml"), "")?;

    let output = call(&["create-kb", "-k", "docs"], "fail", home.path())?;

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("KB_OPERATION_FAILED"), "stderr: {stderr}");
    Ok(())
}
