use super::{HistoryEntry, HistorySink, next_timestamp};
use crate::protocol::Protocol;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// History persisted as one JSON object per line
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl JsonlHistory {
    /// Open (or later create) a history file; existing entries are kept
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_timestamp = read_entries(&path).last().map(|entry| entry.timestamp);
        Self {
            path,
            last_timestamp: Mutex::new(last_timestamp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        let mut line = serde_json::to_string(entry).map_err(io::Error::other)?;
        line.push('\n');

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

impl HistorySink for JsonlHistory {
    fn record(&self, protocol: Protocol) -> HistoryEntry {
        // The lock also serializes appends.
        let mut last = self.last_timestamp.lock();
        let entry = HistoryEntry {
            timestamp: next_timestamp(&mut last),
            protocol,
        };

        if let Err(e) = self.append(&entry) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to persist history entry"
            );
        }
        entry
    }

    fn entries(&self) -> Vec<HistoryEntry> {
        let _guard = self.last_timestamp.lock();
        read_entries(&self.path)
    }
}

fn read_entries(path: &Path) -> Vec<HistoryEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read history file");
            return Vec::new();
        }
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping unreadable history entry"
                );
                None
            }
        })
        .collect()
}
