//! Append-only launcher log file, fed by a `tracing` layer.
//!
//! Every event with a target under [`LAUNCH_TARGET`] at INFO or above is written
//! as `{timestamp} [{LEVEL}] {message} {key=value}*`. WARN is recorded as ERROR.

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, Layer};

use crate::lib::errors::LaunchError;

/// Target prefix of launcher events mirrored into the log file.
pub const LAUNCH_TARGET: &str = "leettools_mcp::launcher";

/// What to do once the log file cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFailurePolicy {
    #[default]
    Ignore,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn from_tracing(level: &Level) -> Option<Self> {
        if *level == Level::ERROR || *level == Level::WARN {
            Some(LogLevel::Error)
        } else if *level == Level::INFO {
            Some(LogLevel::Info)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Format one log line (without the trailing newline).
pub fn format_entry(
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: &str,
    fields: &[(String, String)],
) -> String {
    let mut line = format!(
        "{} [{}] {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        level.as_str(),
        message
    );
    for (key, value) in fields {
        if value.is_empty() || value.contains(char::is_whitespace) {
            line.push_str(&format!(" {key}={value:?}"));
        } else {
            line.push_str(&format!(" {key}={value}"));
        }
    }
    line
}

/// Single-writer append sink. Write failures are recorded, never raised.
pub struct LogSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
    failure: Mutex<Option<String>>,
}

impl LogSink {
    /// Open `path` for appending, creating its directory first.
    pub fn open(path: &Path) -> Arc<Self> {
        let sink = LogSink {
            path: path.to_path_buf(),
            file: Mutex::new(None),
            failure: Mutex::new(None),
        };
        match open_append(path) {
            Ok(file) => {
                if let Ok(mut guard) = sink.file.lock() {
                    *guard = Some(file);
                }
            }
            Err(err) => sink.record_failure(err.to_string()),
        }
        Arc::new(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, level: LogLevel, message: &str, fields: &[(String, String)]) {
        let line = format_entry(Utc::now(), level, message, fields);
        let result = match self.file.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(file) => writeln!(file, "{line}").map_err(|err| err.to_string()),
                None => return,
            },
            Err(_) => Err("log file lock poisoned".to_string()),
        };
        if let Err(message) = result {
            self.record_failure(message);
        }
    }

    /// First recorded failure, if any.
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|guard| guard.clone())
    }

    fn record_failure(&self, message: String) {
        if let Ok(mut guard) = self.failure.lock() {
            guard.get_or_insert(message);
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Launcher log handle: the sink plus its failure policy.
#[derive(Clone)]
pub struct LaunchLog {
    sink: Arc<LogSink>,
    policy: LogFailurePolicy,
}

impl LaunchLog {
    pub fn open(path: &Path, policy: LogFailurePolicy) -> Self {
        Self {
            sink: LogSink::open(path),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }

    pub fn layer(&self) -> LaunchLogLayer {
        LaunchLogLayer {
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn failure(&self) -> Option<String> {
        self.sink.failure()
    }

    /// Under [`LogFailurePolicy::Abort`], turn a recorded write failure into a fatal error.
    pub fn ensure_healthy(&self) -> Result<(), LaunchError> {
        match (self.policy, self.sink.failure()) {
            (LogFailurePolicy::Abort, Some(message)) => Err(LaunchError::LogWrite {
                path: self.sink.path().to_path_buf(),
                message,
            }),
            _ => Ok(()),
        }
    }
}

/// `tracing` layer writing launcher events to a [`LogSink`].
pub struct LaunchLogLayer {
    sink: Arc<LogSink>,
}

impl<S: Subscriber> Layer<S> for LaunchLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(LAUNCH_TARGET) {
            return;
        }
        let Some(level) = LogLevel::from_tracing(metadata.level()) else {
            return;
        };
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);
        self.sink.append(level, &visitor.message, &visitor.fields);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }
}
