use std::path::Path;

use tracing::{error, info};

use crate::{
    launcher::{
        dependencies::http_timeout, log::LAUNCH_TARGET, settings::LaunchSettings, LaunchHost,
    },
    lib::{
        env::{EnvSnapshot, UV_HTTP_TIMEOUT},
        errors::{LaunchError, LaunchStep},
        process::CommandSpec,
    },
};

/// Names from `required` that are unset or blank in `env`, logging one ERROR each.
pub fn missing_required_env(env: &EnvSnapshot, required: &[String]) -> Vec<String> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| env.get_nonempty(name).is_none())
        .cloned()
        .collect();
    for name in &missing {
        error!(target: LAUNCH_TARGET, variable = %name, "Missing required environment variable");
    }
    missing
}

/// `uv --directory <repo> run <server command...>`.
pub fn server_command(settings: &LaunchSettings, uv: &Path, repository: &Path) -> CommandSpec {
    CommandSpec::new(uv)
        .arg("--directory")
        .arg(repository)
        .arg("run")
        .args(settings.server_command.iter().map(String::as_str))
}

/// Validate the environment, spawn the server and wait for it.
///
/// Returns the child's exit code unchanged; a signal-terminated child yields `None`.
pub async fn launch_server<H>(
    host: &H,
    settings: &LaunchSettings,
    uv: &Path,
    repository: &Path,
) -> Result<Option<i32>, LaunchError>
where
    H: LaunchHost + ?Sized,
{
    let missing = missing_required_env(&settings.env, &settings.required_env);
    if !missing.is_empty() {
        return Err(LaunchError::MissingEnvironment { names: missing });
    }

    let mut env = settings.env.clone();
    env.set(UV_HTTP_TIMEOUT, http_timeout(settings));
    let command = server_command(settings, uv, repository);

    info!(
        target: LAUNCH_TARGET,
        command = %command,
        output = settings.output.as_str(),
        "Launching server"
    );
    let exit_code = host
        .run(&command, &env, settings.output)
        .await
        .map_err(|source| LaunchError::Spawn {
            step: LaunchStep::LaunchServer,
            program: command.program_name(),
            source,
        })?;

    match exit_code {
        Some(0) => info!(target: LAUNCH_TARGET, "Server exited cleanly"),
        code => error!(target: LAUNCH_TARGET, exit_code = ?code, "Server exited abnormally"),
    }
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        launcher::{host::OutputMode, testing::{settings_for, FakeHost}},
        lib::env::{EDS_LLM_API_KEY, LEET_HOME},
    };

    #[test]
    fn blank_and_unset_variables_are_both_missing() {
        let env = EnvSnapshot::from_pairs([(LEET_HOME, "/leet"), (EDS_LLM_API_KEY, "")]);
        let required = vec![LEET_HOME.to_string(), EDS_LLM_API_KEY.to_string(), "OTHER".into()];
        assert_eq!(
            missing_required_env(&env, &required),
            vec![EDS_LLM_API_KEY.to_string(), "OTHER".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_credentials_never_spawn_the_server() {
        let host = FakeHost::new();
        let mut settings = settings_for("/leet");
        settings.env = EnvSnapshot::from_pairs([(LEET_HOME, "/leet")]);

        let err = launch_server(&host, &settings, Path::new("uv"), Path::new("/leet/leettools"))
            .await
            .expect_err("credentials missing");

        assert!(matches!(
            err,
            LaunchError::MissingEnvironment { ref names } if names == &[EDS_LLM_API_KEY.to_string()]
        ));
        assert_eq!(err.exit_code(), 1);
        assert!(host.commands().is_empty());
    }

    #[tokio::test]
    async fn child_exit_code_is_returned_with_forwarded_environment() {
        let host = FakeHost::new().with_exit_code("uv", Some(7));
        let mut settings = settings_for("/leet");
        settings.server_command = vec![
            "/opt/leettools-mcp".into(),
            "--config".into(),
            "/etc/mcp.toml".into(),
        ];
        settings.output = OutputMode::Capture;

        let code = launch_server(&host, &settings, Path::new("uv"), Path::new("/leet/leettools"))
            .await
            .expect("spawned");

        assert_eq!(code, Some(7));
        let runs = host.runs();
        assert_eq!(runs.len(), 1);
        let (command, env, output) = &runs[0];
        assert_eq!(
            command.to_string(),
            "uv --directory /leet/leettools run /opt/leettools-mcp --config /etc/mcp.toml"
        );
        assert_eq!(env.get(EDS_LLM_API_KEY), Some("secret"));
        assert_eq!(env.get(UV_HTTP_TIMEOUT), Some("120"));
        assert_eq!(*output, OutputMode::Capture);
        assert_eq!(
            command.args.get(1).map(PathBuf::from),
            Some(PathBuf::from("/leet/leettools"))
        );
    }
}
