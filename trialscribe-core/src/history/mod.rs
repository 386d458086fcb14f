//! Protocol history
//!
//! Every successfully generated protocol is recorded with a timestamp. The
//! sink is injected into the assistant, so retention is the caller's choice:
//! a bounded or unbounded in-memory log, or a JSON-lines file.

mod jsonl;

pub use jsonl::JsonlHistory;

use crate::protocol::Protocol;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub protocol: Protocol,
}

/// Append-only record of generated protocols
pub trait HistorySink: Send + Sync {
    /// Append `protocol` and return the stored entry
    fn record(&self, protocol: Protocol) -> HistoryEntry;

    /// Entries in recording order
    fn entries(&self) -> Vec<HistoryEntry>;

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Next timestamp, never earlier than `last`
pub(crate) fn next_timestamp(last: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let timestamp = match *last {
        Some(previous) if previous > now => previous,
        _ => now,
    };
    *last = Some(timestamp);
    timestamp
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: VecDeque<HistoryEntry>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// In-memory history, optionally capped
#[derive(Debug)]
pub struct InMemoryHistory {
    state: Mutex<MemoryState>,
    capacity: Option<usize>,
}

impl InMemoryHistory {
    /// Keep at most `capacity` entries, evicting the oldest
    pub fn bounded(capacity: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            capacity: None,
        }
    }

    /// Bounded when `max_entries > 0`, unbounded otherwise
    pub fn with_max_entries(max_entries: usize) -> Self {
        if max_entries == 0 {
            Self::unbounded()
        } else {
            Self::bounded(max_entries)
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl HistorySink for InMemoryHistory {
    fn record(&self, protocol: Protocol) -> HistoryEntry {
        let mut state = self.state.lock();
        let entry = HistoryEntry {
            timestamp: next_timestamp(&mut state.last_timestamp),
            protocol,
        };

        if let Some(capacity) = self.capacity {
            while state.entries.len() >= capacity {
                state.entries.pop_front();
                tracing::debug!(capacity, "evicted oldest history entry");
            }
        }
        state.entries.push_back(entry.clone());
        entry
    }

    fn entries(&self) -> Vec<HistoryEntry> {
        self.state.lock().entries.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}
