//! Tool Locator: PATH lookup, install script, re-check, single fallback path.

use std::path::PathBuf;

use tracing::{error, info};

use crate::{
    launcher::{
        host::{LaunchHost, OutputMode},
        log::LAUNCH_TARGET,
        settings::ToolSpec,
    },
    lib::{
        env::EnvSnapshot,
        errors::{LaunchError, LaunchStep},
    },
};

pub async fn locate_tool<H>(
    host: &H,
    tool: &ToolSpec,
    env: &EnvSnapshot,
) -> Result<PathBuf, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    if let Some(path) = host.find_on_path(&tool.name, env.search_path()) {
        info!(
            target: LAUNCH_TARGET,
            tool = %tool.name,
            path = %path.display(),
            "Found tool on PATH"
        );
        return Ok(path);
    }

    let step = LaunchStep::InstallTool;
    info!(
        target: LAUNCH_TARGET,
        step = %step,
        tool = %tool.name,
        installer = %tool.installer,
        "Tool not found on PATH; running install script"
    );
    match host.run(&tool.installer, env, OutputMode::Capture).await {
        Ok(Some(0)) => info!(
            target: LAUNCH_TARGET,
            step = %step,
            tool = %tool.name,
            "Install script finished"
        ),
        Ok(code) => error!(
            target: LAUNCH_TARGET,
            step = %step,
            tool = %tool.name,
            exit_code = ?code,
            "Install script exited abnormally"
        ),
        Err(err) => error!(
            target: LAUNCH_TARGET,
            step = %step,
            tool = %tool.name,
            reason = %err,
            "Failed to run install script"
        ),
    }

    if let Some(path) = host.find_on_path(&tool.name, env.search_path()) {
        info!(
            target: LAUNCH_TARGET,
            tool = %tool.name,
            path = %path.display(),
            "Found tool on PATH after install"
        );
        return Ok(path);
    }

    if let Some(fallback) = tool.fallback_path.as_deref().filter(|path| host.is_file(path)) {
        info!(
            target: LAUNCH_TARGET,
            tool = %tool.name,
            path = %fallback.display(),
            "Using tool from fallback location"
        );
        return Ok(fallback.to_path_buf());
    }

    error!(
        target: LAUNCH_TARGET,
        tool = %tool.name,
        fallback = ?tool.fallback_path,
        "Tool is not installed and could not be installed"
    );
    Err(LaunchError::ToolNotFound {
        tool: tool.name.clone(),
        fallback: tool.fallback_path.clone(),
    })
}
