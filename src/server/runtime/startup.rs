use std::process::ExitCode;

use anyhow::Error;
use rmcp::ServiceExt;

use crate::{
    cli::LaunchProfile,
    lib::{
        env::EnvSnapshot,
        telemetry::{emit_runtime_mode, RuntimeModeTelemetry},
    },
    server::{
        config::ServerConfig,
        runtime::{build_instructions, LeetToolsServer},
    },
    tools::leettools::LeetTools,
};

/// Bundles a runtime error message with an exit code and optional structured error data.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
    error_data: Option<rmcp::model::ErrorData>,
}

impl RuntimeExit {
    pub fn structured(error: rmcp::model::ErrorData, exit_code: ExitCode) -> Self {
        Self {
            message: error.message.to_string(),
            exit_code,
            error_data: Some(error),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
            error_data: None,
        }
    }

    /// Plain message with a specific exit code, e.g. a launch failure carrying a child's status.
    pub fn with_code(message: impl Into<String>, exit_code: u8) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::from(exit_code),
            error_data: None,
        }
    }

    pub fn report(self) -> ExitCode {
        if let Some(data) = self.error_data {
            if let Ok(serialized) = serde_json::to_string(&data) {
                eprintln!("{serialized}");
            } else {
                eprintln!("{}", data.message);
            }
        } else {
            eprintln!("{}", self.message);
        }
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn error_data(&self) -> Option<&rmcp::model::ErrorData> {
        self.error_data.as_ref()
    }
}

/// Start the MCP server on stdio.
pub async fn run_server(
    profile: LaunchProfile,
    config: ServerConfig,
    env: EnvSnapshot,
) -> Result<(), RuntimeExit> {
    let tools = LeetTools::new(&config.leet, env);
    let instructions = build_instructions(&config, &tools);
    let server = LeetToolsServer::new(tools, instructions);

    let executable = server.tools().runner().executable().to_string();
    let output_dir = server.tools().runner().output_dir().to_string_lossy().into_owned();
    emit_runtime_mode(&RuntimeModeTelemetry {
        config_path: config.source_path.to_string_lossy().as_ref(),
        leet_executable: &executable,
        output_dir: &output_dir,
        command_slots: server.tools().runner().available_slots(),
        launch_args: &profile.launch_args,
    });

    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(RuntimeExit::from_error)?;
    running.waiting().await.map_err(RuntimeExit::from_error)?;
    tracing::info!(target: "leettools_mcp::runtime", "MCP client disconnected; shutting down");
    Ok(())
}
