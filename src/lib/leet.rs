//! Shared helpers for locating and invoking the `leet` executable.

use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::lib::{
    env::{EnvSnapshot, LEET_EXECUTABLE, VIRTUAL_ENV},
    paths::{find_executable, venv_bin_dir},
};

/// Bare command name used when no better candidate is found.
pub const LEET_PROGRAM: &str = "leet";

/// How the `leet` executable was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeetExecutable {
    /// From configuration or `LEET_EXECUTABLE`; must exist.
    Explicit(PathBuf),
    /// Found on `PATH`.
    OnPath(PathBuf),
    /// Found in the active virtual environment.
    VirtualEnv(PathBuf),
    /// Nothing found; rely on the OS to resolve `leet` at spawn time.
    Bare,
}

impl LeetExecutable {
    pub fn program(&self) -> &Path {
        match self {
            LeetExecutable::Explicit(path)
            | LeetExecutable::OnPath(path)
            | LeetExecutable::VirtualEnv(path) => path,
            LeetExecutable::Bare => Path::new(LEET_PROGRAM),
        }
    }

    /// An explicit path must point at an existing file.
    pub fn missing_explicit_path(&self) -> Option<&Path> {
        match self {
            LeetExecutable::Explicit(path) if !path.exists() => Some(path),
            _ => None,
        }
    }

    pub const fn source(&self) -> &'static str {
        match self {
            LeetExecutable::Explicit(_) => "explicit",
            LeetExecutable::OnPath(_) => "path",
            LeetExecutable::VirtualEnv(_) => "virtual_env",
            LeetExecutable::Bare => "bare",
        }
    }
}

impl fmt::Display for LeetExecutable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program().display())
    }
}

/// Resolve `leet`: configured path, `LEET_EXECUTABLE`, `PATH`, `$VIRTUAL_ENV`, then the bare name.
pub fn locate_leet(configured: Option<&Path>, env: &EnvSnapshot) -> LeetExecutable {
    if let Some(path) = configured {
        return LeetExecutable::Explicit(path.to_path_buf());
    }
    if let Some(path) = env.path_buf(LEET_EXECUTABLE) {
        return LeetExecutable::Explicit(path);
    }
    if let Some(path) = find_executable(LEET_PROGRAM, env.search_path()) {
        return LeetExecutable::OnPath(path);
    }
    if let Some(venv) = env.path_buf(VIRTUAL_ENV) {
        let file_name = if cfg!(windows) { "leet.exe" } else { LEET_PROGRAM };
        let candidate = venv.join(venv_bin_dir()).join(file_name);
        if candidate.is_file() {
            return LeetExecutable::VirtualEnv(candidate);
        }
    }
    LeetExecutable::Bare
}

/// Render a command line for logs, quoting the value that follows `-q`.
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut parts = vec![program.display().to_string()];
    let mut quote_next = false;
    for arg in args {
        if quote_next {
            parts.push(format!("\"{arg}\""));
            quote_next = false;
        } else {
            quote_next = arg == "-q";
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// Build a piped `leet` command that inherits the given environment.
pub fn build_leet_command(
    executable: &LeetExecutable,
    args: &[String],
    env: &EnvSnapshot,
) -> Command {
    let mut command = Command::new(executable.program());
    command.kill_on_drop(true);
    command.env_clear();
    command.envs(env.child_env());
    command.args(args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command
}
