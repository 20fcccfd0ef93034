//! In-memory [`LaunchHost`] for unit tests.

use std::{
    collections::{BTreeSet, HashMap},
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    launcher::{
        host::{LaunchHost, OutputMode},
        settings::{
            LaunchSettings, ToolSpec, DEFAULT_DEPENDENCIES, DEFAULT_HTTP_TIMEOUT_SECS,
            DEFAULT_PYTHON_VERSION, DEFAULT_REPOSITORY_DIR, DEFAULT_REPOSITORY_URL,
            DEFAULT_VENV_DIR, REQUIRED_ENV_VARS,
        },
    },
    lib::{
        env::{EnvSnapshot, EDS_LLM_API_KEY, LEET_HOME, PATH},
        process::CommandSpec,
    },
};

#[derive(Default)]
struct State {
    on_path: HashMap<String, PathBuf>,
    installs: HashMap<String, PathBuf>,
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
    created: Vec<PathBuf>,
    exit_codes: HashMap<String, Option<i32>>,
    runs: Vec<(CommandSpec, EnvSnapshot, OutputMode)>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, apply: impl FnOnce(&mut State)) -> Self {
        apply(&mut self.state.lock().expect("fake host lock"));
        self
    }

    pub fn with_program_on_path(self, program: &str, path: &str) -> Self {
        self.edit(|state| {
            state.on_path.insert(program.into(), PathBuf::from(path));
        })
    }

    /// `program` appears on PATH once any command has run.
    pub fn installs_on_path(self, program: &str, path: &str) -> Self {
        self.edit(|state| {
            state.installs.insert(program.into(), PathBuf::from(path));
        })
    }

    pub fn with_file(self, path: &str) -> Self {
        self.edit(|state| {
            state.files.insert(PathBuf::from(path));
        })
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.edit(|state| {
            state.dirs.insert(PathBuf::from(path));
        })
    }

    /// Exit code for every command whose program file name is `program`.
    pub fn with_exit_code(self, program: &str, code: Option<i32>) -> Self {
        self.edit(|state| {
            state.exit_codes.insert(program.into(), code);
        })
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.runs().into_iter().map(|(command, _, _)| command).collect()
    }

    pub fn runs(&self) -> Vec<(CommandSpec, EnvSnapshot, OutputMode)> {
        self.state.lock().expect("fake host lock").runs.clone()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.state.lock().expect("fake host lock").created.clone()
    }
}

#[async_trait]
impl LaunchHost for FakeHost {
    fn find_on_path(&self, program: &str, _search_path: Option<&OsStr>) -> Option<PathBuf> {
        self.state
            .lock()
            .expect("fake host lock")
            .on_path
            .get(program)
            .cloned()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state.lock().expect("fake host lock").files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().expect("fake host lock").dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().expect("fake host lock");
        state.dirs.insert(path.to_path_buf());
        state.created.push(path.to_path_buf());
        Ok(())
    }

    async fn run(
        &self,
        command: &CommandSpec,
        env: &EnvSnapshot,
        output: OutputMode,
    ) -> io::Result<Option<i32>> {
        let mut state = self.state.lock().expect("fake host lock");
        state.runs.push((command.clone(), env.clone(), output));
        let installs: Vec<(String, PathBuf)> = state.installs.drain().collect();
        state.on_path.extend(installs);

        let name = Path::new(&command.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(state.exit_codes.get(&name).copied().unwrap_or(Some(0)))
    }
}

/// Settings with every default filled in and credentials present.
pub fn settings_for(home: &str) -> LaunchSettings {
    LaunchSettings {
        home: Some(PathBuf::from(home)),
        tool: ToolSpec::uv(Some(PathBuf::from("/home/leet/.local/bin/uv"))),
        git_program: "git".into(),
        repository_url: DEFAULT_REPOSITORY_URL.into(),
        repository_dir: DEFAULT_REPOSITORY_DIR.into(),
        venv_dir: DEFAULT_VENV_DIR.into(),
        python_version: Some(DEFAULT_PYTHON_VERSION.into()),
        dependencies: DEFAULT_DEPENDENCIES.iter().map(|dep| dep.to_string()).collect(),
        required_env: REQUIRED_ENV_VARS.iter().map(|name| name.to_string()).collect(),
        http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        server_command: vec!["leettools-mcp".into()],
        output: OutputMode::Inherit,
        env: EnvSnapshot::from_pairs([
            (LEET_HOME, home),
            (EDS_LLM_API_KEY, "secret"),
            (PATH, "/usr/bin"),
        ]),
    }
}
