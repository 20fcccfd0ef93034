//! Bootstrap workflow that provisions leettools and starts the MCP server under `uv`.

pub mod dependencies;
pub mod environment;
pub mod host;
pub mod locator;
pub mod log;
pub mod pipeline;
pub mod repository;
pub mod server;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

use tracing::{error, info};

pub use host::{LaunchHost, OutputMode, SystemHost};
pub use log::{LaunchLog, LogFailurePolicy};
pub use pipeline::run_launch;
pub use settings::LaunchSettings;

use crate::lib::{
    env::EnvSnapshot,
    errors::{LaunchError, LaunchStep},
    process::CommandSpec,
};

/// Run one provisioning command with captured output; non-zero exits are fatal.
pub(crate) async fn run_step<H>(
    host: &H,
    step: LaunchStep,
    command: &CommandSpec,
    env: &EnvSnapshot,
) -> Result<(), LaunchError>
where
    H: LaunchHost + ?Sized,
{
    info!(target: log::LAUNCH_TARGET, step = %step, command = %command, "Running step");
    let exit_code = host
        .run(command, env, OutputMode::Capture)
        .await
        .map_err(|source| {
            error!(
                target: log::LAUNCH_TARGET,
                step = %step,
                program = %command.program_name(),
                reason = %source,
                "Failed to spawn step"
            );
            LaunchError::Spawn {
                step,
                program: command.program_name(),
                source,
            }
        })?;

    match exit_code {
        Some(0) => {
            info!(target: log::LAUNCH_TARGET, step = %step, "Step finished");
            Ok(())
        }
        exit_code => {
            error!(
                target: log::LAUNCH_TARGET,
                step = %step,
                exit_code = ?exit_code,
                "Step exited abnormally"
            );
            Err(LaunchError::StepFailed { step, exit_code })
        }
    }
}
