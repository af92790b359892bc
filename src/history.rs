use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::upload::MediaKind;

/// Number of coaching sessions kept for quick re-display.
pub const HISTORY_CAPACITY: usize = 10;

static NEXT_ENTRY_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub file_name: String,
    pub file_kind: MediaKind,
    pub advice: String,
    pub created_at: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(file_name: impl Into<String>, file_kind: MediaKind, advice: impl Into<String>) -> Self {
        let created_at = Local::now();
        // Millisecond stamps collide when sessions finish in the same tick.
        let seq = NEXT_ENTRY_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{}-{seq}", created_at.timestamp_millis()),
            file_name: file_name.into(),
            file_kind,
            advice: advice.into(),
            created_at,
        }
    }
}

/// Newest-first ring of completed sessions.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_back();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
