//! CLI entrypoint module structure.
use anyhow::Result;
use rmcp::model::ErrorData;

use crate::tools::leettools::{CommandResult, LeetTools, ToolRequest};

pub mod args;
pub mod profile;

pub use args::{CallArgs, CallTool, CliCommand, LaunchArgs, LaunchProfileArgs, ParsedCommand};
pub use profile::{
    build_launch_args, build_launch_settings, default_server_command, LaunchProfile,
};

/// Outcome of `call`: the JSON text to print, or the structured tool error.
pub type CallOutcome = Result<String, ErrorData>;

/// Run one operation the same way the MCP tool would and render its JSON.
pub async fn execute_call(
    tools: &LeetTools,
    request: ToolRequest,
    pretty: bool,
) -> Result<CallOutcome> {
    match tools.run(request).await {
        Ok(result) => Ok(Ok(render(&result, pretty)?)),
        Err(error) => Ok(Err(error)),
    }
}

fn render(result: &CommandResult, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(text)
}
