//! Filesystem and process access used by the launch workflow.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{error, info};

use crate::{
    launcher::log::LAUNCH_TARGET,
    lib::{
        env::EnvSnapshot,
        paths::find_executable,
        process::{drain_lines, CommandSpec, OutputStream},
    },
};

/// How a child's stdio is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Pass stdio through untouched.
    #[default]
    Inherit,
    /// Split output into lines and log stdout as INFO, stderr as ERROR.
    Capture,
}

impl OutputMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Inherit => "inherit",
            OutputMode::Capture => "capture",
        }
    }
}

/// Abstraction over the host so tests can substitute a fake filesystem and process table.
#[async_trait]
pub trait LaunchHost: Send + Sync {
    fn find_on_path(&self, program: &str, search_path: Option<&OsStr>) -> Option<PathBuf>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    /// Run `command` to completion with a clean environment built from `env`
    /// plus the command's own overrides. Returns the exit code (`None` on signal).
    async fn run(
        &self,
        command: &CommandSpec,
        env: &EnvSnapshot,
        output: OutputMode,
    ) -> io::Result<Option<i32>>;
}

/// Host backed by the real filesystem and `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

#[async_trait]
impl LaunchHost for SystemHost {
    fn find_on_path(&self, program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
        find_executable(program, search_path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    async fn run(
        &self,
        command: &CommandSpec,
        env: &EnvSnapshot,
        output: OutputMode,
    ) -> io::Result<Option<i32>> {
        let mut child_command = Command::new(&command.program);
        child_command.args(&command.args);
        child_command.env_clear();
        child_command.envs(env.child_env());
        for (key, value) in &command.envs {
            child_command.env(key, value);
        }
        if let Some(dir) = &command.current_dir {
            child_command.current_dir(dir);
        }
        child_command.kill_on_drop(true);

        match output {
            OutputMode::Inherit => {
                let status = child_command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await?;
                Ok(status.code())
            }
            OutputMode::Capture => {
                let mut child = child_command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
                let stderr = child
                    .stderr
                    .take()
                    .ok_or_else(|| io::Error::other("child stderr was not captured"))?;
                let program = command.program_name();
                drain_lines(stdout, stderr, |stream, line| {
                    match stream {
                        OutputStream::Stdout => {
                            info!(target: LAUNCH_TARGET, program = %program, "{line}")
                        }
                        OutputStream::Stderr => {
                            error!(target: LAUNCH_TARGET, program = %program, "{line}")
                        }
                    }
                    Ok(())
                })
                .await?;
                let status = child.wait().await?;
                Ok(status.code())
            }
        }
    }
}
