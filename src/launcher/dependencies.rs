use std::path::Path;

use tracing::info;

use crate::{
    launcher::{log::LAUNCH_TARGET, run_step, settings::LaunchSettings, LaunchHost},
    lib::{
        env::UV_HTTP_TIMEOUT,
        errors::{LaunchError, LaunchStep},
        process::CommandSpec,
    },
};

/// Install the configured dependency list. Runs on every launch.
pub async fn install_dependencies<H>(
    host: &H,
    settings: &LaunchSettings,
    uv: &Path,
    repository: &Path,
) -> Result<(), LaunchError>
where
    H: LaunchHost + ?Sized,
{
    let command = CommandSpec::new(uv)
        .args(["pip", "install"])
        .args(settings.dependencies.iter().map(String::as_str))
        .current_dir(repository)
        .env(UV_HTTP_TIMEOUT, http_timeout(settings));

    info!(
        target: LAUNCH_TARGET,
        count = settings.dependencies.len(),
        "Installing dependencies"
    );
    run_step(host, LaunchStep::InstallDependencies, &command, &settings.env).await
}

/// Parent value when set, otherwise the configured default.
pub(crate) fn http_timeout(settings: &LaunchSettings) -> String {
    settings
        .env
        .get_nonempty(UV_HTTP_TIMEOUT)
        .map(str::to_string)
        .unwrap_or_else(|| settings.http_timeout_secs.to_string())
}
