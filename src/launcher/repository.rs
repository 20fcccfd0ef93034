use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    launcher::{log::LAUNCH_TARGET, run_step, settings::LaunchSettings, LaunchHost},
    lib::{
        errors::{LaunchError, LaunchStep},
        process::CommandSpec,
    },
};

/// Make sure `home` exists and holds a clone of the leettools repository.
///
/// An existing checkout is left alone; nothing is fetched or updated.
pub async fn ensure_repository<H>(
    host: &H,
    settings: &LaunchSettings,
    home: &Path,
) -> Result<PathBuf, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    if !host.is_dir(home) {
        info!(target: LAUNCH_TARGET, path = %home.display(), "Creating home directory");
        host.create_dir_all(home)
            .map_err(|source| LaunchError::CreateDir {
                path: home.to_path_buf(),
                source,
            })?;
    }

    let repository = home.join(&settings.repository_dir);
    if host.is_dir(&repository) {
        info!(
            target: LAUNCH_TARGET,
            path = %repository.display(),
            "Repository already present; skipping clone"
        );
        return Ok(repository);
    }

    info!(
        target: LAUNCH_TARGET,
        url = %settings.repository_url,
        path = %repository.display(),
        "Cloning repository"
    );
    let clone = CommandSpec::new(&settings.git_program)
        .args(["clone", settings.repository_url.as_str(), settings.repository_dir.as_str()])
        .current_dir(home);
    run_step(host, LaunchStep::Clone, &clone, &settings.env).await?;
    Ok(repository)
}
