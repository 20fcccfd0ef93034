//! Load and validate configuration for the server and the launcher.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::{
    env::{EnvSnapshot, HOME, MCP_CONFIG_PATH},
    errors::ConfigError,
};

pub mod launcher;
pub mod leet;
pub mod telemetry;

pub use launcher::{parse_launcher_section, LauncherConfig, RawLauncherSection};
pub use leet::{
    default_output_dir, parse_leet_section, LeetConfig, RawLeetSection,
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_KNOWLEDGE_BASE, DEFAULT_MAX_CONCURRENT_COMMANDS,
};

pub(crate) const CONFIG_ENV_KEY: &str = MCP_CONFIG_PATH;
pub(crate) const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_TARGET: &str = "leettools_mcp::config";

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    CommandLine,
    Environment,
    Default,
}

/// A configuration file path plus whether it has to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

impl ConfigLocation {
    /// `--config`, then `MCP_CONFIG_PATH`, then `config.toml` in the working directory.
    pub fn resolve(cli_path: Option<PathBuf>, env: &EnvSnapshot) -> Self {
        if let Some(path) = cli_path {
            return Self {
                path,
                origin: ConfigOrigin::CommandLine,
            };
        }
        match env.path_buf(CONFIG_ENV_KEY) {
            Some(path) => Self {
                path,
                origin: ConfigOrigin::Environment,
            },
            None => Self {
                path: PathBuf::from(DEFAULT_CONFIG_PATH),
                origin: ConfigOrigin::Default,
            },
        }
    }

    /// Explicitly named files must exist; the default file is optional.
    pub fn is_required(&self) -> bool {
        self.origin != ConfigOrigin::Default
    }
}

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub leet: LeetConfig,
    pub launcher: LauncherConfig,
    pub source_path: PathBuf,
    pub file_loaded: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawServerConfig {
    leet: Option<RawLeetSection>,
    launcher: Option<RawLauncherSection>,
}

impl ServerConfig {
    /// Resolve the path from the CLI flag or environment and load it.
    pub fn load(cli_path: Option<PathBuf>, env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let location = ConfigLocation::resolve(cli_path, env);
        telemetry::log_source(&location);
        Self::load_from_location(&location, env)
    }

    /// Load configuration from a specific path that must exist.
    pub fn load_from_path(path: PathBuf, env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let location = ConfigLocation {
            path,
            origin: ConfigOrigin::CommandLine,
        };
        Self::load_from_location(&location, env)
    }

    pub fn load_from_location(
        location: &ConfigLocation,
        env: &EnvSnapshot,
    ) -> Result<Self, ConfigError> {
        let path = location.path.clone();
        info!(
            target: CONFIG_TARGET,
            path = %path.display(),
            required = location.is_required(),
            "Starting configuration load"
        );

        let file_loaded = path.is_file();
        let builder = config::Config::builder().add_source(
            config::File::from(path.clone())
                .format(config::FileFormat::Toml)
                .required(location.is_required()),
        );
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: CONFIG_TARGET,
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawServerConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: CONFIG_TARGET,
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone(), file_loaded, env).map_err(|err| {
            error!(
                target: CONFIG_TARGET,
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(
        raw: RawServerConfig,
        path: PathBuf,
        file_loaded: bool,
        env: &EnvSnapshot,
    ) -> Result<Self, ConfigError> {
        let user_home = user_home(env);
        let leet = parse_leet_section(raw.leet, &path, env, user_home.as_deref())?;
        let launcher = parse_launcher_section(raw.launcher, &path, user_home.as_deref())?;

        Ok(Self {
            leet,
            launcher,
            source_path: path,
            file_loaded,
        })
    }
}

/// `$HOME` from the snapshot, else the platform home directory.
pub fn user_home(env: &EnvSnapshot) -> Option<PathBuf> {
    env.path_buf(HOME).or_else(dirs::home_dir)
}

/// Returns the path unchanged if absolute, else joined onto the working directory.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
