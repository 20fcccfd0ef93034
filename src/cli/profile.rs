//! LaunchProfile and the mapping from configuration to launcher settings.
use std::path::{Path, PathBuf};

use crate::{
    launcher::{
        settings::{ToolSpec, REQUIRED_ENV_VARS},
        LaunchSettings, OutputMode,
    },
    lib::env::{EnvSnapshot, LEET_HOME},
    server::config::{absolutize, ServerConfig},
};

/// Resolved launch profile shared by every mode.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub config_override: Option<PathBuf>,
    pub launch_args: Vec<String>,
}

impl LaunchProfile {
    pub fn new(config_override: Option<PathBuf>, mode: &str) -> Self {
        let launch_args = build_launch_args(mode, config_override.as_deref());
        Self {
            config_override,
            launch_args,
        }
    }
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(mode: &str, config: Option<&Path>) -> Vec<String> {
    let mut args = vec![format!("--mode={mode}")];
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    args
}

/// Command that starts the MCP server: the configured one, else this binary.
///
/// A config file that was actually read is passed on so the server sees the same settings.
pub fn default_server_command(current_exe: &Path, config: &ServerConfig) -> Vec<String> {
    let mut command = vec![current_exe.to_string_lossy().into_owned()];
    if config.file_loaded {
        command.push("--config".into());
        command.push(absolutize(&config.source_path).to_string_lossy().into_owned());
    }
    command
}

/// Turn loaded configuration plus the process environment into launcher settings.
pub fn build_launch_settings(
    config: &ServerConfig,
    mut env: EnvSnapshot,
    current_exe: &Path,
    output_override: Option<OutputMode>,
) -> LaunchSettings {
    let launcher = &config.launcher;
    if let Some(home) = &config.leet.home {
        env.set_default(LEET_HOME, home.to_string_lossy());
    }
    let server_command = launcher
        .server_command
        .clone()
        .unwrap_or_else(|| default_server_command(current_exe, config));

    LaunchSettings {
        home: config.leet.home.clone(),
        tool: ToolSpec::uv(launcher.uv_fallback_path.clone()),
        git_program: launcher.git_program.clone(),
        repository_url: launcher.repository_url.clone(),
        repository_dir: launcher.repository_dir.clone(),
        venv_dir: launcher.venv_dir.clone(),
        python_version: launcher.python_version.clone(),
        dependencies: launcher.dependencies.clone(),
        required_env: REQUIRED_ENV_VARS.iter().map(|name| name.to_string()).collect(),
        http_timeout_secs: launcher.http_timeout_secs,
        server_command,
        output: output_override.unwrap_or(launcher.output),
        env,
    }
}
