use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    launcher::{log::LAUNCH_TARGET, run_step, settings::LaunchSettings, LaunchHost},
    lib::{
        errors::{LaunchError, LaunchStep},
        process::CommandSpec,
    },
};

/// Create the virtual environment inside `repository` unless it already exists.
pub async fn ensure_environment<H>(
    host: &H,
    settings: &LaunchSettings,
    uv: &Path,
    repository: &Path,
) -> Result<PathBuf, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    let venv = repository.join(&settings.venv_dir);
    if host.is_dir(&venv) {
        info!(
            target: LAUNCH_TARGET,
            path = %venv.display(),
            "Virtual environment already present; skipping creation"
        );
        return Ok(venv);
    }

    let mut command = CommandSpec::new(uv).arg("venv");
    if let Some(version) = &settings.python_version {
        command = command.args(["--python", version.as_str()]);
    }
    let command = command.arg(&settings.venv_dir).current_dir(repository);

    info!(target: LAUNCH_TARGET, path = %venv.display(), "Creating virtual environment");
    run_step(host, LaunchStep::CreateEnvironment, &command, &settings.env).await?;
    Ok(venv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::testing::{settings_for, FakeHost};

    #[tokio::test]
    async fn existing_venv_is_reused() {
        let host = FakeHost::new().with_dir("/leet/leettools/.venv");
        let settings = settings_for("/leet");

        ensure_environment(&host, &settings, Path::new("/bin/uv"), Path::new("/leet/leettools"))
            .await
            .expect("venv present");

        assert!(host.commands().is_empty());
    }

    #[tokio::test]
    async fn missing_venv_runs_uv_venv_with_python_version() {
        let host = FakeHost::new();
        let settings = settings_for("/leet");

        let venv = ensure_environment(
            &host,
            &settings,
            Path::new("/bin/uv"),
            Path::new("/leet/leettools"),
        )
        .await
        .expect("venv created");

        assert_eq!(venv, PathBuf::from("/leet/leettools/.venv"));
        let commands = host.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].to_string(), "/bin/uv venv --python 3.11 .venv");
        assert_eq!(
            commands[0].current_dir.as_deref(),
            Some(Path::new("/leet/leettools"))
        );
    }
}
