use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::warn;

use super::CONFIG_TARGET;
use crate::lib::{
    env::{EnvSnapshot, CONTEXT_LENGTH, LEET_HOME},
    errors::ConfigError,
    paths::{expand_home, is_nonempty_absolute},
};

pub const DEFAULT_KNOWLEDGE_BASE: &str = "mcp_search";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 1800;
pub const DEFAULT_MAX_CONCURRENT_COMMANDS: usize = 1;
pub const MAX_CONCURRENT_COMMANDS_LIMIT: usize = 16;
pub const OUTPUT_DIR_NAME: &str = "mcp_outputs";
pub const APP_DIR_NAME: &str = "leettools-mcp";

/// `[leet]` section: how the server finds and drives the `leet` CLI.
#[derive(Debug, Clone)]
pub struct LeetConfig {
    pub home: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub context_length: Option<usize>,
    pub default_knowledge_base: String,
    pub command_timeout: Duration,
    pub max_concurrent_commands: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLeetSection {
    pub home: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub context_length: Option<usize>,
    pub default_knowledge_base: Option<String>,
    pub command_timeout_secs: Option<u64>,
    pub max_concurrent_commands: Option<usize>,
}

/// Environment values (`LEET_HOME`, `CONTEXT_LENGTH`) take precedence over the file.
/// An unusable `CONTEXT_LENGTH` is ignored with a warning; only tool output reads it.
pub fn parse_leet_section(
    raw: Option<RawLeetSection>,
    path: &Path,
    env: &EnvSnapshot,
    user_home: Option<&Path>,
) -> Result<LeetConfig, ConfigError> {
    let raw = raw.unwrap_or_default();
    let expand = |value: PathBuf| expand_home(&value, user_home);

    let home = env.path_buf(LEET_HOME).or(raw.home).map(expand);
    if let Some(home) = &home {
        validate_absolute(path, "leet.home", home)?;
    }

    let executable = raw.executable.map(expand);
    if let Some(executable) = &executable {
        if executable.as_os_str().is_empty() {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "leet.executable",
                message: "Executable path cannot be empty".into(),
            });
        }
    }

    let output_dir = match raw.output_dir.map(expand) {
        Some(dir) => {
            validate_absolute(path, "leet.output_dir", &dir)?;
            dir
        }
        None => default_output_dir(home.as_deref()),
    };

    let context_length = match env.get_nonempty(CONTEXT_LENGTH) {
        Some(value) => match value.trim().parse::<usize>() {
            Ok(length) if length > 0 => Some(length),
            _ => {
                warn!(
                    target: CONFIG_TARGET,
                    value,
                    "Ignoring {CONTEXT_LENGTH}: expected a positive integer"
                );
                raw.context_length
            }
        },
        None => raw.context_length,
    };
    if context_length == Some(0) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "leet.context_length",
            message: "Context length must be greater than zero".into(),
        });
    }

    let default_knowledge_base = raw
        .default_knowledge_base
        .unwrap_or_else(|| DEFAULT_KNOWLEDGE_BASE.to_string());
    if default_knowledge_base.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "leet.default_knowledge_base",
            message: "Knowledge base name cannot be empty".into(),
        });
    }

    let command_timeout_secs = raw
        .command_timeout_secs
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS);
    if command_timeout_secs == 0 {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "leet.command_timeout_secs",
            message: "Timeout must be at least one second".into(),
        });
    }

    let max_concurrent_commands = raw
        .max_concurrent_commands
        .unwrap_or(DEFAULT_MAX_CONCURRENT_COMMANDS);
    if !(1..=MAX_CONCURRENT_COMMANDS_LIMIT).contains(&max_concurrent_commands) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "leet.max_concurrent_commands",
            message: format!(
                "Must be between 1 and {MAX_CONCURRENT_COMMANDS_LIMIT}, got {max_concurrent_commands}"
            ),
        });
    }

    Ok(LeetConfig {
        home,
        executable,
        output_dir,
        context_length,
        default_knowledge_base,
        command_timeout: Duration::from_secs(command_timeout_secs),
        max_concurrent_commands,
    })
}

/// `<home>/mcp_outputs`, else `<data-local-dir>/leettools-mcp/mcp_outputs`.
pub fn default_output_dir(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => home.join(OUTPUT_DIR_NAME),
        None => dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME)
            .join(OUTPUT_DIR_NAME),
    }
}

fn validate_absolute(path: &Path, field: &'static str, value: &Path) -> Result<(), ConfigError> {
    if is_nonempty_absolute(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: format!("Only absolute paths are allowed: {}", value.display()),
        })
    }
}
