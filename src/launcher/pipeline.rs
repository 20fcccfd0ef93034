//! The launch workflow: tool, repository, environment, dependencies, server.

use tracing::{error, info};

use crate::{
    launcher::{
        dependencies::install_dependencies,
        environment::ensure_environment,
        locator::locate_tool,
        log::{LaunchLog, LAUNCH_TARGET},
        repository::ensure_repository,
        server::launch_server,
        settings::LaunchSettings,
        LaunchHost,
    },
    lib::errors::LaunchError,
};

/// Run every launch step in order and return the server's exit code.
///
/// Each step finishes before the next starts. Any failure is logged and ends the run.
pub async fn run_launch<H>(
    host: &H,
    settings: &LaunchSettings,
    log: &LaunchLog,
) -> Result<Option<i32>, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    info!(target: LAUNCH_TARGET, log_file = %log.path().display(), "Launch started");
    let result = run_steps(host, settings, log).await;
    if let Err(err) = &result {
        error!(target: LAUNCH_TARGET, exit_code = err.exit_code(), "Launch failed: {err}");
    }
    result
}

async fn run_steps<H>(
    host: &H,
    settings: &LaunchSettings,
    log: &LaunchLog,
) -> Result<Option<i32>, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    log.ensure_healthy()?;
    let Some(home) = settings.home.as_deref() else {
        error!(target: LAUNCH_TARGET, variable = "LEET_HOME", "Home directory is not configured");
        return Err(LaunchError::MissingHome);
    };

    let uv = locate_tool(host, &settings.tool, &settings.env).await?;
    log.ensure_healthy()?;

    let repository = ensure_repository(host, settings, home).await?;
    log.ensure_healthy()?;

    ensure_environment(host, settings, &uv, &repository).await?;
    log.ensure_healthy()?;

    install_dependencies(host, settings, &uv, &repository).await?;
    log.ensure_healthy()?;

    launch_server(host, settings, &uv, &repository).await
}
