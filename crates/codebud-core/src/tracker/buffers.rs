use super::ChangeRecord;
use std::collections::VecDeque;

/// A consumer of the change stream.
pub trait ChangeSink {
    fn accept(&mut self, record: &ChangeRecord);
}

/// Fixed-capacity FIFO window; the oldest record is evicted first.
pub struct RecentChanges {
    records: VecDeque<ChangeRecord>,
    capacity: usize,
}

impl RecentChanges {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn last(&self, n: usize) -> Vec<ChangeRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl ChangeSink for RecentChanges {
    fn accept(&mut self, record: &ChangeRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record.clone());
    }
}

/// Unbounded queue emptied by every read.
#[derive(Default)]
pub struct PendingChanges {
    records: Vec<ChangeRecord>,
}

impl PendingChanges {
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ChangeSink for PendingChanges {
    fn accept(&mut self, record: &ChangeRecord) {
        self.records.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> ChangeRecord {
        ChangeRecord {
            text: text.to_string(),
            line: 1,
            timestamp: 0,
        }
    }

    #[test]
    fn test_recent_evicts_oldest() {
        let mut recent = RecentChanges::new(2);
        recent.accept(&record("a"));
        recent.accept(&record("b"));
        recent.accept(&record("c"));
        let texts: Vec<_> = recent.last(10).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut recent = RecentChanges::new(0);
        recent.accept(&record("a"));
        assert!(recent.is_empty());
    }

    #[test]
    fn test_pending_drain_empties() {
        let mut pending = PendingChanges::default();
        pending.accept(&record("a"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.drain().len(), 1);
        assert!(pending.is_empty());
    }
}
