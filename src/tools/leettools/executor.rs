use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Local;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, time};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::{
    lib::{
        env::EnvSnapshot,
        errors::OperationError,
        fs::{
            ensure_output_dir, operation_paths, read_output_content, truncate_chars,
            CommandLogFile,
        },
        leet::{build_leet_command, display_command, LeetExecutable},
        process::{drain_lines, OutputStream},
        telemetry::OperationSpan,
    },
    server::config::LeetConfig,
};

use super::{options::CommandOptions, request::LeetInvocation};

const LEET_TARGET: &str = "leettools_mcp::leet";
const UNKNOWN_ERROR: &str = "Unknown error";

/// One knowledge base as listed by `leet kb list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeBaseEntry {
    pub org: String,
    pub kb: String,
    pub id: String,
}

/// Result of one LeetTools operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_bases: Option<Vec<KnowledgeBaseEntry>>,
}

/// Raw outcome of a finished `leet` process.
#[derive(Debug)]
struct CommandOutput {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    log_path: PathBuf,
}

/// Runs `leet` commands with per-operation output and log files.
#[derive(Clone)]
pub struct LeetRunner {
    executable: LeetExecutable,
    env: Arc<EnvSnapshot>,
    output_dir: PathBuf,
    command_timeout: Duration,
    context_length: Option<usize>,
    slots: Arc<Semaphore>,
}

impl LeetRunner {
    pub fn new(executable: LeetExecutable, config: &LeetConfig, env: EnvSnapshot) -> Self {
        Self {
            executable,
            env: Arc::new(env),
            output_dir: config.output_dir.clone(),
            command_timeout: config.command_timeout,
            context_length: config.context_length,
            slots: Arc::new(Semaphore::new(config.max_concurrent_commands)),
        }
    }

    pub fn executable(&self) -> &LeetExecutable {
        &self.executable
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Free command slots right now.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run one operation end to end and shape its result.
    pub async fn perform(
        &self,
        invocation: &LeetInvocation,
    ) -> Result<CommandResult, OperationError> {
        let operation_id = Uuid::new_v4();
        let operation = OperationSpan::start(operation_id, invocation.kind.as_str());
        let span = operation.span().clone();

        let result = self
            .perform_inner(invocation, operation_id)
            .instrument(span)
            .await;
        match &result {
            Ok(_) => operation.finish("succeeded", Some(0)),
            Err(OperationError::CommandFailed { exit_code, .. }) => {
                operation.finish("failed", *exit_code)
            }
            Err(OperationError::Timeout { .. }) => operation.finish("timed_out", None),
            Err(OperationError::NoResults { .. }) => operation.finish("no_results", Some(0)),
            Err(_) => operation.finish("error", None),
        }
        result
    }

    async fn perform_inner(
        &self,
        invocation: &LeetInvocation,
        operation_id: Uuid,
    ) -> Result<CommandResult, OperationError> {
        let options = invocation.kind.options(invocation.knowledge_base.as_deref());
        info!(target: LEET_TARGET, operation = %invocation.kind, "Performing operation");

        ensure_output_dir(&self.output_dir)?;
        let paths = operation_paths(
            &self.output_dir,
            &options.output_prefix,
            options.output_suffix,
            Local::now(),
            &operation_id,
        );
        info!(
            target: LEET_TARGET,
            output = %paths.output.display(),
            log = %paths.log.display(),
            "Resolved operation files"
        );

        let mut args = invocation.args.clone();
        if options.read_output_file {
            args.push("-o".into());
            args.push(paths.output.to_string_lossy().into_owned());
        }

        let output = {
            let _permit = self
                .slots
                .acquire()
                .await
                .map_err(|err| OperationError::Execution {
                    message: format!("command slots closed: {err}"),
                })?;
            self.run_command(&args, &paths.log).await?
        };

        if output.exit_code != Some(0) {
            let stderr = if output.stderr.trim().is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                output.stderr.clone()
            };
            error!(
                target: LEET_TARGET,
                operation = %invocation.kind,
                exit_code = ?output.exit_code,
                "Operation failed: {stderr}"
            );
            return Err(OperationError::CommandFailed {
                exit_code: output.exit_code,
                stderr,
                log_path: output.log_path,
            });
        }

        shape_result(&options, output, &paths.output, self.context_length, invocation)
    }

    async fn run_command(
        &self,
        args: &[String],
        log_path: &std::path::Path,
    ) -> Result<CommandOutput, OperationError> {
        if let Some(path) = self.executable.missing_explicit_path() {
            return Err(OperationError::ExecutableNotFound {
                path: path.to_path_buf(),
            });
        }

        let rendered = display_command(self.executable.program(), args);
        info!(target: LEET_TARGET, command = %rendered, "Running command");

        let mut log = CommandLogFile::create(log_path, &rendered, Local::now())?;
        let mut command = build_leet_command(&self.executable, args, &self.env);
        let mut child = command.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                OperationError::ExecutableNotFound {
                    path: self.executable.program().to_path_buf(),
                }
            } else {
                OperationError::from(err)
            }
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OperationError::Execution {
                message: "leet stdout was not captured".into(),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| OperationError::Execution {
                message: "leet stderr was not captured".into(),
            })?;

        let mut stdout_text = String::new();
        let mut stderr_text = String::new();
        let finished = time::timeout(self.command_timeout, async {
            drain_lines(stdout, stderr, |stream, line| {
                let buffer = match stream {
                    OutputStream::Stdout => &mut stdout_text,
                    OutputStream::Stderr => &mut stderr_text,
                };
                buffer.push_str(&line);
                buffer.push('\n');
                log.write_line(stream, &line)
            })
            .await?;
            child.wait().await
        })
        .await;

        let status = match finished {
            Ok(status) => status?,
            Err(_) => {
                let duration_secs = self.command_timeout.as_secs();
                warn!(
                    target: LEET_TARGET,
                    duration_secs,
                    "Command exceeded its timeout; killing it"
                );
                if let Err(err) = child.kill().await {
                    warn!(target: LEET_TARGET, reason = %err, "Failed to kill timed out command");
                }
                log.write_note(&format!("Command timed out after {duration_secs} seconds"))?;
                let log_path = log.finish(None)?;
                return Err(OperationError::Timeout {
                    duration_secs,
                    log_path,
                });
            }
        };

        let log_path = log.finish(status.code())?;
        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: stdout_text,
            stderr: stderr_text,
            log_path,
        })
    }
}

fn shape_result(
    options: &CommandOptions,
    output: CommandOutput,
    output_path: &std::path::Path,
    context_length: Option<usize>,
    invocation: &LeetInvocation,
) -> Result<CommandResult, OperationError> {
    let mut result = CommandResult {
        success: true,
        log_path: Some(output.log_path.to_string_lossy().into_owned()),
        ..CommandResult::default()
    };

    if options.read_output_file {
        let content = read_output_content(output_path)?;
        let content = match content {
            Some(content) => {
                info!(
                    target: LEET_TARGET,
                    bytes = content.len(),
                    path = %output_path.display(),
                    "Read output file"
                );
                content
            }
            None => {
                warn!(
                    target: LEET_TARGET,
                    path = %output_path.display(),
                    "Output file empty or missing"
                );
                if options.no_results.is_some() {
                    return Err(OperationError::NoResults {
                        operation: invocation.kind.as_str(),
                        log_path: output.log_path,
                    });
                }
                String::new()
            }
        };
        result.content = Some(match context_length {
            Some(limit) => truncate_chars(&content, limit),
            None => content,
        });
        result.instructions = options.instructions.map(str::to_string);
    }

    if options.parse_knowledge_bases {
        result.knowledge_bases = Some(parse_kb_list(&output.stdout));
    }
    if options.return_stdout {
        result.stdout = Some(output.stdout);
    }
    if options.return_stderr {
        result.stderr = Some(output.stderr);
    }
    Ok(result)
}

/// Parse `Org: <org>    KB: <kb>    ID: <id>` lines; other lines are ignored.
pub fn parse_kb_list(stdout: &str) -> Vec<KnowledgeBaseEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Org:")?;
            let (org, rest) = rest.split_once("KB:")?;
            let (kb, id) = rest.split_once("ID:")?;
            Some(KnowledgeBaseEntry {
                org: org.trim().to_string(),
                kb: kb.trim().to_string(),
                id: id.trim().to_string(),
            })
        })
        .collect()
}
