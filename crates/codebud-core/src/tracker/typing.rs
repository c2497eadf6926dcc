use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingState {
    pub is_typing: bool,
    /// Epoch millis of the last change, 0 if there never was one.
    pub last_change_time: i64,
    /// Whole seconds since the last change, -1 if there never was one.
    pub seconds_since_last_change: i64,
}

/// Debounced typing detector. A single idle deadline is pushed out by every
/// change; typing ends when `now` reaches it.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    timeout_ms: i64,
    last_change: Option<i64>,
    idle_deadline: Option<i64>,
}

impl TypingTracker {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            timeout_ms,
            last_change: None,
            idle_deadline: None,
        }
    }

    pub fn touch(&mut self, now: i64) {
        self.last_change = Some(now);
        self.idle_deadline = Some(now + self.timeout_ms);
    }

    pub fn is_typing(&self, now: i64) -> bool {
        self.idle_deadline.is_some_and(|deadline| now < deadline)
    }

    pub fn state(&self, now: i64) -> TypingState {
        match self.last_change {
            Some(last) => TypingState {
                is_typing: self.is_typing(now),
                last_change_time: last,
                seconds_since_last_change: (now - last).max(0).div_euclid(1000),
            },
            None => TypingState {
                is_typing: false,
                last_change_time: 0,
                seconds_since_last_change: -1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_reports_sentinel() {
        let tracker = TypingTracker::new(3000);
        let state = tracker.state(50_000);
        assert!(!state.is_typing);
        assert_eq!(state.last_change_time, 0);
        assert_eq!(state.seconds_since_last_change, -1);
    }

    #[test]
    fn test_seconds_since_last_change_floors() {
        let mut tracker = TypingTracker::new(3000);
        tracker.touch(10_000);
        assert_eq!(tracker.state(10_999).seconds_since_last_change, 0);
        assert_eq!(tracker.state(11_000).seconds_since_last_change, 1);
        assert_eq!(tracker.state(17_450).seconds_since_last_change, 7);
    }

    #[test]
    fn test_typing_stops_after_timeout() {
        let mut tracker = TypingTracker::new(3000);
        tracker.touch(0);
        assert!(tracker.is_typing(0));
        assert!(tracker.is_typing(2_999));
        assert!(!tracker.is_typing(3_000));
    }

    #[test]
    fn test_burst_of_changes_yields_single_transition() {
        let mut tracker = TypingTracker::new(3000);
        // Ten changes, each inside the previous debounce window.
        for i in 0..10 {
            tracker.touch(i * 1_000);
        }

        let mut transitions = 0;
        let mut was_typing = true;
        for now in (9_000..20_000).step_by(100) {
            let typing = tracker.is_typing(now);
            if was_typing && !typing {
                transitions += 1;
            }
            was_typing = typing;
        }

        assert_eq!(transitions, 1);
        assert!(!tracker.is_typing(12_000));
        assert!(tracker.is_typing(11_999));
    }
}
