//! Resolved inputs of one launch run.

use std::path::PathBuf;

use crate::{
    launcher::host::OutputMode,
    lib::{
        env::{EnvSnapshot, EDS_LLM_API_KEY, LEET_HOME},
        process::CommandSpec,
    },
};

/// Official `uv` installer for Unix shells.
pub const UV_INSTALL_SCRIPT_UNIX: &str = "curl -LsSf https://astral.sh/uv/install.sh | sh";
/// Official `uv` installer for PowerShell.
pub const UV_INSTALL_SCRIPT_WINDOWS: &str = "irm https://astral.sh/uv/install.ps1 | iex";

pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/leettools-dev/leettools.git";
pub const DEFAULT_REPOSITORY_DIR: &str = "leettools";
pub const DEFAULT_VENV_DIR: &str = ".venv";
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
/// The cloned project itself plus the pinned runtime packages it expects.
pub const DEFAULT_DEPENDENCIES: &[&str] = &[".", "pydantic==2.10.6", "python-dotenv==1.0.1"];

/// Variables that must be present before the server is spawned.
pub const REQUIRED_ENV_VARS: &[&str] = &[LEET_HOME, EDS_LLM_API_KEY];

/// A tool that is located on `PATH`, installed on demand, or found at one fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub installer: CommandSpec,
    pub fallback_path: Option<PathBuf>,
}

impl ToolSpec {
    /// `uv` with the platform's official install script.
    pub fn uv(fallback_path: Option<PathBuf>) -> Self {
        let installer = if cfg!(windows) {
            CommandSpec::new("powershell")
                .args(["-ExecutionPolicy", "ByPass", "-c", UV_INSTALL_SCRIPT_WINDOWS])
        } else {
            CommandSpec::new("sh").args(["-c", UV_INSTALL_SCRIPT_UNIX])
        };
        Self {
            name: "uv".into(),
            installer,
            fallback_path,
        }
    }
}

/// Everything the launch workflow needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub home: Option<PathBuf>,
    pub tool: ToolSpec,
    pub git_program: String,
    pub repository_url: String,
    pub repository_dir: String,
    pub venv_dir: String,
    pub python_version: Option<String>,
    pub dependencies: Vec<String>,
    pub required_env: Vec<String>,
    pub http_timeout_secs: u64,
    pub server_command: Vec<String>,
    pub output: OutputMode,
    pub env: EnvSnapshot,
}

impl LaunchSettings {
    pub fn repository_path(&self) -> Option<PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(&self.repository_dir))
    }
}
