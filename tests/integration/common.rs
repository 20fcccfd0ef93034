use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use rmcp::{
    model::{CallToolRequestParam, CallToolResult, ClientInfo},
    serve_client,
    service::ServiceError,
    ServiceExt,
};
use serde_json::{Map, Value};

use leettools_mcp::{
    lib::env::EnvSnapshot,
    server::{config::LeetConfig, runtime::LeetToolsServer},
    tools::leettools::LeetTools,
};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_leettools-mcp");

pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

pub fn mock_leet() -> PathBuf {
    fixture("tests/fixtures/mock-leet.sh")
}

pub fn leet_config(output_dir: &Path) -> LeetConfig {
    LeetConfig {
        home: Some(PathBuf::from("/srv/leet-home")),
        executable: Some(mock_leet()),
        output_dir: output_dir.to_path_buf(),
        context_length: None,
        default_knowledge_base: "mcp_search".into(),
        command_timeout: Duration::from_secs(20),
        max_concurrent_commands: 1,
    }
}

pub fn mock_env(behavior: &str) -> EnvSnapshot {
    EnvSnapshot::from_pairs([
        ("PATH", "/usr/bin:/bin"),
        ("MOCK_LEET_BEHAVIOR", behavior),
    ])
}

/// Serve the tools in-process and make one call over a duplex pipe.
pub async fn call_tool(
    config: &LeetConfig,
    env: EnvSnapshot,
    name: &str,
    arguments: Value,
) -> Result<Result<CallToolResult, ServiceError>> {
    let server = LeetToolsServer::new(LeetTools::new(config, env), "test".into());
    let (server_transport, client_transport) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        server.serve(server_transport).await?.waiting().await?;
        Result::<_, anyhow::Error>::Ok(())
    });
    let client = serve_client(ClientInfo::default(), client_transport).await?;

    let call_result = client
        .call_tool(CallToolRequestParam {
            name: name.to_string().into(),
            arguments: arguments.as_object().cloned(),
        })
        .await;

    let _ = client.cancel().await;
    let _ = server_task.await;
    Ok(call_result)
}

pub fn error_data(error: ServiceError) -> Map<String, Value> {
    match error {
        ServiceError::McpError(inner) => inner
            .data
            .and_then(|data| data.as_object().cloned())
            .expect("error data should be an object"),
        other => panic!("Unexpected error: {other:?}", other = other),
    }
}

pub fn structured(result: CallToolResult) -> Map<String, Value> {
    result
        .structured_content
        .and_then(|value| value.as_object().cloned())
        .expect("structured_content should exist")
}
