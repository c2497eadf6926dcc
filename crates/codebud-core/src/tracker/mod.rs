//! Change tracking for the focused document.
//!
//! Every text mutation is published once and fanned out to two subscribers:
//! a bounded ring of recent changes (shared window) and a drain-on-read queue
//! that reports each change to exactly one poll.

mod buffers;
mod typing;

pub use buffers::{ChangeSink, PendingChanges, RecentChanges};
pub use typing::{TypingState, TypingTracker};

use crate::constants::tracking;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Trimmed, never empty.
    pub text: String,
    /// 1-indexed line where the change starts.
    pub line: usize,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

pub struct ChangeTracker {
    recent: RecentChanges,
    pending: PendingChanges,
    typing: TypingTracker,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            recent: RecentChanges::new(tracking::MAX_CHANGES),
            pending: PendingChanges::default(),
            typing: TypingTracker::new(tracking::TYPING_TIMEOUT_MS),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.recent = RecentChanges::new(capacity);
        self
    }

    pub fn with_typing_timeout(mut self, timeout_ms: i64) -> Self {
        self.typing = TypingTracker::new(timeout_ms);
        self
    }

    /// Observe one text mutation. Any mutation counts as typing activity; only
    /// text that is non-empty after trimming becomes a `ChangeRecord`.
    /// Returns the record when one was stored.
    pub fn record_change(&mut self, text: &str, line: usize, now: i64) -> Option<ChangeRecord> {
        self.typing.touch(now);

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let record = ChangeRecord {
            text: trimmed.to_string(),
            line: line.max(1),
            timestamp: now,
        };
        self.publish(&record);
        Some(record)
    }

    fn publish(&mut self, record: &ChangeRecord) {
        let sinks: [&mut dyn ChangeSink; 2] = [&mut self.recent, &mut self.pending];
        for sink in sinks {
            sink.accept(record);
        }
    }

    /// The last `n` records, oldest first.
    pub fn recent_changes(&self, n: usize) -> Vec<ChangeRecord> {
        self.recent.last(n)
    }

    pub fn recent_change_texts(&self, n: usize) -> Vec<String> {
        self.recent_changes(n).into_iter().map(|c| c.text).collect()
    }

    /// Returns everything recorded since the previous call and empties the queue.
    pub fn take_changes_since_last_poll(&mut self) -> Vec<ChangeRecord> {
        self.pending.drain()
    }

    pub fn typing_state(&self, now: i64) -> TypingState {
        self.typing.state(now)
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
        self.pending.drain();
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}
