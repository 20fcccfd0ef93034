use std::{fmt, io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use rmcp::model::ErrorData;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Steps of the launch workflow, used to tag failures and log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStep {
    InstallTool,
    Clone,
    CreateEnvironment,
    InstallDependencies,
    LaunchServer,
}

impl LaunchStep {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LaunchStep::InstallTool => "install_tool",
            LaunchStep::Clone => "clone_repository",
            LaunchStep::CreateEnvironment => "create_environment",
            LaunchStep::InstallDependencies => "install_dependencies",
            LaunchStep::LaunchServer => "launch_server",
        }
    }
}

impl fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal conditions of the launch workflow. None of them are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("LEET_HOME is not set; cannot decide where to provision leettools")]
    MissingHome,
    #[error("Required environment variables are not set: {}", names.join(", "))]
    MissingEnvironment { names: Vec<String> },
    #[error("`{tool}` was not found on PATH or at its fallback location")]
    ToolNotFound {
        tool: String,
        fallback: Option<PathBuf>,
    },
    #[error("Step {step} exited abnormally (exit={exit_code:?})")]
    StepFailed {
        step: LaunchStep,
        exit_code: Option<i32>,
    },
    #[error("Failed to spawn `{program}` during {step}: {source}")]
    Spawn {
        step: LaunchStep,
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write launcher log {path}: {message}")]
    LogWrite { path: PathBuf, message: String },
}

impl LaunchError {
    /// Process exit code for this failure: the child's code when a step failed, else 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::StepFailed { exit_code, .. } => {
                crate::lib::process::exit_code_byte(*exit_code)
            }
            _ => 1,
        }
    }
}

/// Failures of a single `leet` operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("LeetTools executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },
    #[error("leet exited abnormally (exit={exit_code:?}): {stderr}")]
    CommandFailed {
        exit_code: Option<i32>,
        stderr: String,
        log_path: PathBuf,
    },
    #[error("leet did not finish within {duration_secs} seconds")]
    Timeout {
        duration_secs: u64,
        log_path: PathBuf,
    },
    #[error("The {operation} operation did not produce any content")]
    NoResults {
        operation: &'static str,
        log_path: PathBuf,
    },
    #[error("Failed to run leet: {message}")]
    Execution { message: String },
}

impl From<io::Error> for OperationError {
    fn from(value: io::Error) -> Self {
        OperationError::Execution {
            message: value.to_string(),
        }
    }
}

/// Structured error metadata returned by MCP tools.
#[derive(Debug, Clone)]
pub struct ToolErrorDescriptor {
    /// Error code.
    pub code: &'static str,
    /// User-facing message.
    pub message: &'static str,
    /// Recommended remediation.
    pub remediation: &'static str,
}

impl ToolErrorDescriptor {
    pub const fn new(code: &'static str, message: &'static str, remediation: &'static str) -> Self {
        Self {
            code,
            message,
            remediation,
        }
    }

    pub fn builder(&self) -> ToolErrorDescriptorBuilder<'_> {
        ToolErrorDescriptorBuilder::new(self)
    }
}

/// Builder for error data that fails if required fields are missing.
pub struct ToolErrorDescriptorBuilder<'a> {
    descriptor: &'a ToolErrorDescriptor,
    retryable: Option<bool>,
    internal: bool,
    details: Option<Value>,
    extra_fields: Map<String, Value>,
}

impl<'a> ToolErrorDescriptorBuilder<'a> {
    pub fn new(descriptor: &'a ToolErrorDescriptor) -> Self {
        Self {
            descriptor,
            retryable: None,
            internal: false,
            details: None,
            extra_fields: Map::new(),
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    /// Report as an internal error instead of invalid parameters.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context_field(mut self, key: &str, value: Value) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }

    pub fn with_exit_code_value(mut self, exit_code: Option<i32>) -> Self {
        let value = exit_code
            .map(|code| Value::Number(Number::from(code)))
            .unwrap_or(Value::Null);
        self.extra_fields.insert("exit_code".into(), value);
        self
    }

    pub fn build(self) -> Result<ErrorData, ToolErrorBuilderError> {
        if self.descriptor.remediation.trim().is_empty() {
            return Err(ToolErrorBuilderError::MissingRemediation {
                code: self.descriptor.code,
            });
        }
        let retryable = self
            .retryable
            .ok_or(ToolErrorBuilderError::MissingRetryable {
                code: self.descriptor.code,
            })?;

        let mut data = Map::new();
        data.insert("code".into(), Value::String(self.descriptor.code.into()));
        data.insert(
            "remediation".into(),
            Value::String(self.descriptor.remediation.into()),
        );
        data.insert("retryable".into(), Value::Bool(retryable));
        if let Some(details) = self.details {
            data.insert("details".into(), details);
        }
        for (key, value) in self.extra_fields {
            data.insert(key, value);
        }

        let data = Some(Value::Object(data));
        if self.internal {
            Ok(ErrorData::internal_error(self.descriptor.message, data))
        } else {
            Ok(ErrorData::invalid_params(self.descriptor.message, data))
        }
    }
}

/// Errors when required builder fields are missing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolErrorBuilderError {
    #[error("retryable is missing (code={code})")]
    MissingRetryable { code: &'static str },
    #[error("remediation is empty (code={code})")]
    MissingRemediation { code: &'static str },
}
