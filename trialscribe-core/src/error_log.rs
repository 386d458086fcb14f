//! Append-only failure log
//!
//! Every failed assistant operation is recorded exactly once as a
//! `<ISO-8601 timestamp>: <message>` line. Recording never fails the caller;
//! I/O problems are reported through `tracing` and otherwise dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl ErrorLogRecord {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    /// On-disk line, including the trailing newline
    pub fn to_line(&self) -> String {
        format_record_line(&self.timestamp, &self.message)
    }
}

/// Render one log line; embedded line breaks are flattened to spaces
pub fn format_record_line(timestamp: &DateTime<Utc>, message: &str) -> String {
    let flattened: String = message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "{}: {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        flattened.trim_end()
    )
}

/// Sink for operation failures
pub trait ErrorLog: Send + Sync {
    fn record(&self, message: &str);
}

/// Error log backed by a file opened in append mode for each record
#[derive(Debug)]
pub struct FileErrorLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl ErrorLog for FileErrorLog {
    fn record(&self, message: &str) {
        let line = ErrorLogRecord::now(message).to_line();
        if let Err(e) = self.append(&line) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write error log record"
            );
        }
    }
}

/// In-memory error log
#[derive(Debug, Default)]
pub struct MemoryErrorLog {
    records: Mutex<Vec<ErrorLogRecord>>,
}

impl MemoryErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ErrorLogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ErrorLog for MemoryErrorLog {
    fn record(&self, message: &str) {
        self.records.lock().push(ErrorLogRecord::now(message));
    }
}
