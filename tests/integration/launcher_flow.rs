use std::{
    fs,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::Result;
use tempfile::{tempdir, TempDir};

use crate::common::{fixture, BINARY_PATH};

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Result<Self> {
        let root = tempdir()?;
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin)?;
        symlink(fixture("tests/fixtures/fake-uv.sh"), bin.join("uv"))?;
        Ok(Self { root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn write_config(&self, with_home: bool) -> Result<PathBuf> {
        let mut text = String::new();
        if with_home {
            text.push_str(&format!("[leet]\nhome = \"{}\"\n\n", self.path("home").display()));
        }
        text.push_str(&format!(
            "[launcher]\ngit_program = \"{git}\"\nuv_fallback_path = \"{fallback}\"\nlog_file = \"{log}\"\nserver_command = [\"leettools-mcp\"]\noutput = \"capture\"\n",
            git = fixture("tests/fixtures/fake-git.sh").display(),
            fallback = self.path("no-such-uv").display(),
            log = self.path("logs/launcher.log").display(),
        ));
        let path = self.path("config.toml");
        fs::write(&path, text)?;
        Ok(path)
    }

    fn launch(&self, config: &Path, extra_env: &[(&str, &str)]) -> Result<Output> {
        let search_path = format!("{}:/usr/bin:/bin", self.path("bin").display());
        let mut command = Command::new(BINARY_PATH);
        command
            .arg("launch")
            .arg("--config")
            .arg(config)
            .env_clear()
            .env("PATH", search_path)
            .env("HOME", self.root.path())
            .env("FAKE_TOOL_RECORD", self.path("record.txt"));
        for (key, value) in extra_env {
            command.env(key, value);
        }
        Ok(command.output()?)
    }

    fn record(&self) -> String {
        fs::read_to_string(self.path("record.txt")).unwrap_or_default()
    }

    fn log(&self) -> String {
        fs::read_to_string(self.path("logs/launcher.log")).unwrap_or_default()
    }
}

#[test]
fn unset_home_exits_one_before_cloning() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let config = sandbox.write_config(false)?;

    let output = sandbox.launch(&config, &[("EDS_LLM_API_KEY", "secret")])?;

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    assert!(!sandbox.record().contains("git clone"), "record: {}", sandbox.record());
    let log = sandbox.log();
    assert!(
        log.lines()
            .any(|line| line.contains("[ERROR]") && line.contains("LEET_HOME")),
        "log: {log}"
    );
    Ok(())
}

#[test]
fn fresh_home_is_provisioned_and_server_exit_code_propagates() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let config = sandbox.write_config(true)?;

    let output = sandbox.launch(
        &config,
        &[("EDS_LLM_API_KEY", "secret"), ("FAKE_UV_RUN_EXIT", "7")],
    )?;

    assert_eq!(output.status.code(), Some(7), "{output:?}");
    let record = sandbox.record();
    let steps: Vec<&str> = record.lines().collect();
    assert_eq!(steps.len(), 4, "record: {record}");
    assert!(steps[0].starts_with("git clone https://github.com/leettools-dev/leettools.git"));
    assert!(steps[1].starts_with("uv venv"), "record: {record}");
    assert!(steps[2].starts_with("uv pip install ."), "record: {record}");
    assert!(steps[3].contains("run leettools-mcp"), "record: {record}");
    assert!(sandbox.path("home/leettools").is_dir());

    let log = sandbox.log();
    assert!(log.lines().any(|line| line.contains("[INFO] Launch started")), "log: {log}");
    assert!(log.lines().any(|line| line.contains("[INFO] clone finished")), "log: {log}");
    assert!(
        log.lines().any(|line| line.contains("[ERROR] Cloning into")),
        "log: {log}"
    );
    assert!(
        log.lines()
            .any(|line| line.contains("[INFO] Resolved 3 packages \u{FFFD}")),
        "log: {log}"
    );
    assert!(
        log.lines()
            .any(|line| line.contains("[ERROR] warning: pip cache disabled")),
        "log: {log}"
    );
    Ok(())
}

#[test]
fn missing_credential_stops_before_server_and_log_is_appended() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let config = sandbox.write_config(true)?;

    let first = sandbox.launch(&config, &[])?;
    assert_eq!(first.status.code(), Some(1), "{first:?}");
    let first_log_len = sandbox.log().len();
    assert!(sandbox.log().contains("EDS_LLM_API_KEY"));
    assert!(!sandbox.record().contains(" run "), "record: {}", sandbox.record());

    let second = sandbox.launch(&config, &[("EDS_LLM_API_KEY", "secret")])?;
    assert_eq!(second.status.code(), Some(0), "{second:?}");
    assert!(sandbox.log().len() > first_log_len, "log must be appended");
    // The clone from the first run is reused.
    assert_eq!(sandbox.record().matches("git clone").count(), 1);
    Ok(())
}
