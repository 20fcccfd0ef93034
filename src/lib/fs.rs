//! Utilities for operation output directories, output files and per-command log files.

use std::{
    fs::{self, File},
    io::{self, LineWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::lib::process::OutputStream;

/// Suffix of the per-operation command log.
pub const LOG_SUFFIX: &str = ".log";

/// Output and log file locations for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPaths {
    pub output: PathBuf,
    pub log: PathBuf,
}

/// Create the output directory (and parents) when missing.
pub fn ensure_output_dir(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Build `<dir>/<prefix>_<YYYYmmdd_HHMMSS>_<id8><suffix>` paths for output and log.
pub fn operation_paths(
    dir: &Path,
    prefix: &str,
    output_suffix: &str,
    started_at: DateTime<Local>,
    operation_id: &Uuid,
) -> OperationPaths {
    let timestamp = started_at.format("%Y%m%d_%H%M%S");
    let id = operation_id.simple().to_string();
    let stem = format!("{prefix}_{timestamp}_{}", &id[..8]);
    OperationPaths {
        output: dir.join(format!("{stem}{output_suffix}")),
        log: dir.join(format!("{stem}{LOG_SUFFIX}")),
    }
}

/// Read an output file; a missing or empty file yields `None`.
pub fn read_output_content(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) if content.is_empty() => Ok(None),
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Keep at most `limit` characters from the start of `content`.
pub fn truncate_chars(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((byte_index, _)) => content[..byte_index].to_string(),
        None => content.to_string(),
    }
}

/// Per-command log file: header, tagged output lines, exit trailer.
pub struct CommandLogFile {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl CommandLogFile {
    pub fn create(
        path: &Path,
        display_command: &str,
        started_at: DateTime<Local>,
    ) -> io::Result<Self> {
        let mut writer = LineWriter::new(File::create(path)?);
        writeln!(writer, "Command: {display_command}")?;
        writeln!(writer, "Timestamp: {}", started_at.to_rfc3339())?;
        writeln!(writer)?;
        writeln!(writer, "=== STDOUT & STDERR ===")?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, stream: OutputStream, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}: {line}", stream.label())
    }

    pub fn write_note(&mut self, note: &str) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{note}")
    }

    pub fn finish(mut self, exit_code: Option<i32>) -> io::Result<PathBuf> {
        let code = exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "none (terminated by signal)".into());
        self.write_note(&format!("Process exited with code: {code}"))?;
        self.writer.flush()?;
        Ok(self.path)
    }
}
