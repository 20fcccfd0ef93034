//! Telemetry initialization and leet operation span helpers.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::{
    launcher::log::LaunchLogLayer,
    lib::env::{EnvSnapshot, ENABLE_DEBUG_LOGGING},
};

/// Default filter: `RUST_LOG`, else `debug` when `ENABLE_DEBUG_LOGGING` is truthy, else `info`.
pub fn default_filter(env: &EnvSnapshot) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if env.flag(ENABLE_DEBUG_LOGGING) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Initialize `tracing` and format developer logs on stderr. Stdout belongs to MCP.
pub fn init_tracing(env: &EnvSnapshot) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    fmt()
        .with_env_filter(default_filter(env))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Initialize `tracing` for launch mode: stderr output plus the launcher log file.
///
/// Scoped subscribers set with `with_default` before this call do not count as
/// a global one, so no `has_been_set` shortcut here.
pub fn init_launcher_tracing(env: &EnvSnapshot, file_layer: LaunchLogLayer) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(default_filter(env));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper to record start and finish of a leet operation.
pub struct OperationSpan {
    span: Span,
    started_at: Instant,
    operation_id: Uuid,
}

impl OperationSpan {
    pub fn start(operation_id: Uuid, operation: &'static str) -> Self {
        let span = info_span!(
            target: "leettools_mcp::leet",
            "leet_operation",
            %operation_id,
            operation
        );
        Self {
            span,
            started_at: Instant::now(),
            operation_id,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording status and completion info.
    pub fn finish(self, status: &'static str, exit_code: Option<i32>) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "leettools_mcp::leet",
            operation_id = %self.operation_id,
            status = status,
            exit_code = exit_code,
            elapsed_ms = elapsed_ms,
            "Completed leet operation"
        );
    }
}

/// Payload for logging MCP runtime state as structured telemetry.
#[derive(Debug, Serialize)]
pub struct RuntimeModeTelemetry<'a> {
    pub config_path: &'a str,
    pub leet_executable: &'a str,
    pub output_dir: &'a str,
    pub command_slots: usize,
    pub launch_args: &'a [String],
}

/// Emit runtime mode to `tracing`.
pub fn emit_runtime_mode(telemetry: &RuntimeModeTelemetry<'_>) {
    info!(
        target: "leettools_mcp::runtime",
        transport = "stdio",
        config_path = telemetry.config_path,
        leet_executable = telemetry.leet_executable,
        output_dir = telemetry.output_dir,
        command_slots = telemetry.command_slots,
        launch_args = ?telemetry.launch_args,
        "Started MCP server"
    );
}
