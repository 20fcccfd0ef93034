use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::{
    launcher::{
        settings::{
            DEFAULT_DEPENDENCIES, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PYTHON_VERSION,
            DEFAULT_REPOSITORY_DIR, DEFAULT_REPOSITORY_URL, DEFAULT_VENV_DIR,
        },
        LogFailurePolicy, OutputMode,
    },
    lib::{
        errors::ConfigError,
        paths::{expand_home, is_nonempty_absolute},
    },
    server::config::leet::APP_DIR_NAME,
};

pub const DEFAULT_GIT_PROGRAM: &str = "git";
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = "launcher.log";

/// `[launcher]` section: provisioning and spawn settings for `leettools-mcp launch`.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub repository_url: String,
    pub repository_dir: String,
    pub venv_dir: String,
    pub python_version: Option<String>,
    pub dependencies: Vec<String>,
    pub git_program: String,
    /// `None` when no home directory is known and none was configured.
    pub uv_fallback_path: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub log_file: PathBuf,
    pub log_failure: LogFailurePolicy,
    pub output: OutputMode,
    pub server_command: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLauncherSection {
    pub repository_url: Option<String>,
    pub repository_dir: Option<String>,
    pub venv_dir: Option<String>,
    pub python_version: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub git_program: Option<String>,
    pub uv_fallback_path: Option<PathBuf>,
    pub http_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub log_failure: Option<LogFailurePolicy>,
    pub output: Option<OutputMode>,
    pub server_command: Option<Vec<String>>,
}

pub fn parse_launcher_section(
    raw: Option<RawLauncherSection>,
    path: &Path,
    user_home: Option<&Path>,
) -> Result<LauncherConfig, ConfigError> {
    let raw = raw.unwrap_or_default();

    let repository_url = raw
        .repository_url
        .unwrap_or_else(|| DEFAULT_REPOSITORY_URL.to_string());
    require_non_blank(path, "launcher.repository_url", &repository_url)?;

    let repository_dir = raw
        .repository_dir
        .unwrap_or_else(|| DEFAULT_REPOSITORY_DIR.to_string());
    validate_dir_name(path, "launcher.repository_dir", &repository_dir)?;

    let venv_dir = raw
        .venv_dir
        .unwrap_or_else(|| DEFAULT_VENV_DIR.to_string());
    validate_dir_name(path, "launcher.venv_dir", &venv_dir)?;

    // An empty string lets uv pick the interpreter.
    let python_version = match raw.python_version {
        Some(version) if version.trim().is_empty() => None,
        Some(version) => Some(version.trim().to_string()),
        None => Some(DEFAULT_PYTHON_VERSION.to_string()),
    };

    let dependencies = raw.dependencies.unwrap_or_else(|| {
        DEFAULT_DEPENDENCIES
            .iter()
            .map(|dependency| dependency.to_string())
            .collect()
    });
    if dependencies.is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launcher.dependencies",
            message: "At least one dependency is required".into(),
        });
    }
    for dependency in &dependencies {
        require_non_blank(path, "launcher.dependencies", dependency)?;
    }

    let git_program = raw
        .git_program
        .unwrap_or_else(|| DEFAULT_GIT_PROGRAM.to_string());
    require_non_blank(path, "launcher.git_program", &git_program)?;

    let uv_fallback_path = match raw.uv_fallback_path {
        Some(fallback) => {
            let fallback = expand_home(&fallback, user_home);
            validate_absolute(path, "launcher.uv_fallback_path", &fallback)?;
            Some(fallback)
        }
        None => default_uv_fallback(user_home),
    };

    let http_timeout_secs = raw.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    if http_timeout_secs == 0 {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launcher.http_timeout_secs",
            message: "Timeout must be at least one second".into(),
        });
    }

    let log_file = match raw.log_file {
        Some(log_file) => {
            let log_file = expand_home(&log_file, user_home);
            validate_absolute(path, "launcher.log_file", &log_file)?;
            log_file
        }
        None => default_log_file(),
    };

    let server_command = raw.server_command;
    if let Some(command) = &server_command {
        match command.first() {
            Some(program) if !program.trim().is_empty() => {}
            None => {
                return Err(ConfigError::MissingField {
                    path: path.to_path_buf(),
                    field: "launcher.server_command",
                })
            }
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    path: path.to_path_buf(),
                    field: "launcher.server_command",
                    message: "The first element must name the server program".into(),
                })
            }
        }
    }

    Ok(LauncherConfig {
        repository_url,
        repository_dir,
        venv_dir,
        python_version,
        dependencies,
        git_program,
        uv_fallback_path,
        http_timeout_secs,
        log_file,
        log_failure: raw.log_failure.unwrap_or_default(),
        output: raw.output.unwrap_or_default(),
        server_command,
    })
}

/// Where the official installer drops `uv`: `~/.local/bin/uv`. Without a home
/// directory there is no fallback.
pub fn default_uv_fallback(user_home: Option<&Path>) -> Option<PathBuf> {
    let name = if cfg!(windows) { "uv.exe" } else { "uv" };
    user_home.map(|home| home.join(".local").join("bin").join(name))
}

/// `<data-local-dir>/leettools-mcp/logs/launcher.log`.
pub fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(LOG_DIR_NAME)
        .join(LOG_FILE_NAME)
}

fn require_non_blank(path: &Path, field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: "Value cannot be empty".into(),
        });
    }
    Ok(())
}

/// A single relative path component such as `leettools` or `.venv`.
fn validate_dir_name(path: &Path, field: &'static str, value: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: format!("Expected a single directory name, got `{value}`"),
        }),
    }
}

fn validate_absolute(path: &Path, field: &'static str, value: &Path) -> Result<(), ConfigError> {
    if is_nonempty_absolute(value) {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: format!("Only absolute paths are allowed: {}", value.display()),
    })
}
