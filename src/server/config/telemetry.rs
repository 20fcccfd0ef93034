use tracing::{debug, info};

use super::{
    ConfigLocation, ConfigOrigin, ServerConfig, CONFIG_ENV_KEY, CONFIG_TARGET, DEFAULT_CONFIG_PATH,
};

pub fn log_source(location: &ConfigLocation) {
    match location.origin {
        ConfigOrigin::CommandLine => info!(
            target: CONFIG_TARGET,
            path = %location.path.display(),
            "Loading configuration from --config"
        ),
        ConfigOrigin::Environment => info!(
            target: CONFIG_TARGET,
            path = %location.path.display(),
            "Loading configuration using MCP_CONFIG_PATH environment variable"
        ),
        ConfigOrigin::Default => debug!(
            target: CONFIG_TARGET,
            path = %location.path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "MCP_CONFIG_PATH not set; using optional default config.toml"
        ),
    }
}

pub fn log_loaded(config: &ServerConfig) {
    info!(
        target: CONFIG_TARGET,
        path = %config.source_path.display(),
        file_loaded = config.file_loaded,
        leet_home = ?config.leet.home,
        output_dir = %config.leet.output_dir.display(),
        default_knowledge_base = %config.leet.default_knowledge_base,
        command_timeout_secs = config.leet.command_timeout.as_secs(),
        max_concurrent_commands = config.leet.max_concurrent_commands,
        launcher_log = %config.launcher.log_file.display(),
        "Configuration loaded successfully"
    );
}
