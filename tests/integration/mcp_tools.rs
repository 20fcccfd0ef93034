use std::{fs, time::Duration};

use anyhow::Result;
use rmcp::{model::ClientInfo, serve_client, ServiceExt};
use serde_json::{json, Value};
use tempfile::tempdir;

use leettools_mcp::{
    server::runtime::LeetToolsServer,
    tools::leettools::LeetTools,
};

use crate::common::{call_tool, error_data, leet_config, mock_env, structured};

#[tokio::test]
async fn server_lists_all_six_tools() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());
    let server = LeetToolsServer::new(LeetTools::new(&config, mock_env("success")), "test".into());
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        server.serve(server_transport).await?.waiting().await?;
        Result::<_, anyhow::Error>::Ok(())
    });
    let client = serve_client(ClientInfo::default(), client_transport).await?;
    let list = client.list_tools(None).await;
    let _ = client.cancel().await;
    let _ = server_task.await;

    let mut names: Vec<String> = list?
        .tools
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "add_local_to_kb",
            "create_kb",
            "extract",
            "kb_search",
            "list_kb",
            "web_search"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn kb_search_returns_output_file_content_and_log() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let result = call_tool(
        &config,
        mock_env("success"),
        "kb_search",
        json!({ "query": "async runtimes", "knowledge_base_name": "docs" }),
    )
    .await?
    .expect("kb_search should succeed");
    let payload = structured(result);

    assert_eq!(payload.get("success").and_then(Value::as_bool), Some(true));
    let content = payload
        .get("content")
        .and_then(Value::as_str)
        .expect("content");
    assert!(
        content.contains("flow -t search -k docs -q async runtimes -p retriever_type=local -o"),
        "content: {content}"
    );
    assert!(content.contains("LEET_HOME=/srv/leet-home"), "content: {content}");
    assert!(payload.get("instructions").and_then(Value::as_str).is_some());
    assert!(payload.get("stdout").is_none());

    let log_path = payload
        .get("log_path")
        .and_then(Value::as_str)
        .expect("log_path");
    assert!(log_path.contains("kb_search_docs_"), "log_path: {log_path}");
    let log = fs::read_to_string(log_path)?;
    assert!(log.contains("-q \"async runtimes\""), "log: {log}");
    assert!(log.contains("STDOUT: mock leet flow"), "log: {log}");
    assert!(log.contains("STDERR: debug: done"), "log: {log}");
    assert!(log.contains("Process exited with code: 0"), "log: {log}");
    Ok(())
}

#[tokio::test]
async fn web_search_uses_requested_knowledge_base() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let result = call_tool(
        &config,
        mock_env("success"),
        "web_search",
        json!({ "query": "rust", "knowledge_base_name": "news", "search_max_results": 3 }),
    )
    .await?
    .expect("web_search should succeed");
    let content = structured(result)
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .expect("content");

    assert!(
        content.contains(
            "flow -t search -k news -q rust -p search_max_results=3 -p search_iteration=1"
        ),
        "content: {content}"
    );
    Ok(())
}

#[tokio::test]
async fn failing_command_maps_to_operation_failure_code() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let error = call_tool(
        &config,
        mock_env("fail"),
        "web_search",
        json!({ "query": "rust" }),
    )
    .await?
    .expect_err("web_search should fail");
    let data = error_data(error);

    assert_eq!(data.get("code").and_then(Value::as_str), Some("WEB_SEARCH_FAILED"));
    assert_eq!(data.get("exit_code").and_then(Value::as_i64), Some(3));
    assert_eq!(data.get("operation").and_then(Value::as_str), Some("web_search"));
    assert_eq!(
        data.get("details")
            .and_then(|details| details.get("stderr"))
            .and_then(Value::as_str)
            .map(str::trim),
        Some("knowledge base not found")
    );
    Ok(())
}

#[tokio::test]
async fn empty_output_reports_no_results() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let error = call_tool(
        &config,
        mock_env("empty"),
        "kb_search",
        json!({ "query": "nothing here" }),
    )
    .await?
    .expect_err("kb_search should report no results");

    assert_eq!(
        error_data(error).get("code").and_then(Value::as_str),
        Some("NO_KB_RESULTS")
    );
    Ok(())
}

#[tokio::test]
async fn list_kb_parses_knowledge_bases() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let result = call_tool(&config, mock_env("success"), "list_kb", json!({}))
        .await?
        .expect("list_kb should succeed");
    let payload = structured(result);
    let entries = payload
        .get("knowledge_bases")
        .and_then(Value::as_array)
        .expect("knowledge_bases");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].get("kb").and_then(Value::as_str), Some("docs"));
    assert!(payload.get("stdout").and_then(Value::as_str).is_some());
    assert!(payload.get("content").is_none());
    Ok(())
}

#[tokio::test]
async fn add_local_to_kb_rejects_missing_path() -> Result<()> {
    let output = tempdir()?;
    let config = leet_config(output.path());

    let error = call_tool(
        &config,
        mock_env("success"),
        "add_local_to_kb",
        json!({ "local_path": output.path().join("missing-folder") }),
    )
    .await?
    .expect_err("missing path must be rejected");
    let data = error_data(error);

    assert_eq!(data.get("code").and_then(Value::as_str), Some("LOCAL_PATH_NOT_FOUND"));
    assert_eq!(data.get("retryable").and_then(Value::as_bool), Some(false));
    Ok(())
}

#[tokio::test]
async fn content_is_truncated_to_context_length() -> Result<()> {
    let output = tempdir()?;
    let mut config = leet_config(output.path());
    config.context_length = Some(9);

    let result = call_tool(
        &config,
        mock_env("success"),
        "kb_search",
        json!({ "query": "rust" }),
    )
    .await?
    .expect("kb_search should succeed");

    assert_eq!(
        structured(result).get("content").and_then(Value::as_str),
        Some("# Results")
    );
    Ok(())
}

#[tokio::test]
async fn slow_command_times_out() -> Result<()> {
    let output = tempdir()?;
    let mut config = leet_config(output.path());
    config.command_timeout = Duration::from_secs(1);

    let error = call_tool(
        &config,
        mock_env("sleep"),
        "create_kb",
        json!({ "knowledge_base_name": "slow" }),
    )
    .await?
    .expect_err("create_kb should time out");
    let data = error_data(error);

    assert_eq!(data.get("code").and_then(Value::as_str), Some("COMMAND_TIMEOUT"));
    let log_path = data
        .get("log_path")
        .and_then(Value::as_str)
        .expect("log_path");
    let log = fs::read_to_string(log_path)?;
    assert!(log.contains("timed out after 1 seconds"), "log: {log}");
    Ok(())
}
