//! # Alert log
//!
//! Bounded, most-recent-first history of geofence and arrival alerts.

use std::collections::VecDeque;

use crate::model::Alert;

/// Maximum number of alerts retained.
pub const ALERT_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self { entries: VecDeque::with_capacity(ALERT_CAPACITY + 1) }
    }
}

impl AlertLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, alert: Alert) {
        self.entries.push_front(alert);
        self.entries.truncate(ALERT_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The first `n` alerts, most recent first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Alert> {
        self.entries.iter().take(n).cloned().collect()
    }

    #[must_use]
    pub fn all(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn alert(seq: usize) -> Alert {
        Alert {
            vehicle_id: format!("BUS_{seq}"),
            message: format!("alert {seq}"),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            kind: "arrival".to_string(),
        }
    }

    #[test]
    fn capped_at_capacity() {
        let mut log = AlertLog::new();
        for seq in 0..45 {
            log.push(alert(seq));
            assert!(log.len() <= ALERT_CAPACITY);
        }

        assert_eq!(log.len(), ALERT_CAPACITY);
        // newest first, oldest surviving entry is #25
        assert_eq!(log.recent(1), vec![alert(44)]);
        assert_eq!(log.all().last(), Some(&alert(25)));
    }

    #[test]
    fn recent_in_reverse_insertion_order() {
        let mut log = AlertLog::new();
        for seq in 0..5 {
            log.push(alert(seq));
        }

        for k in 0..=5 {
            let expected: Vec<Alert> = (0..5).rev().take(k).map(alert).collect();
            assert_eq!(log.recent(k), expected);
        }
        assert_eq!(log.recent(50).len(), 5);
    }

    #[test]
    fn recent_does_not_mutate() {
        let mut log = AlertLog::new();
        log.push(alert(1));
        let _ = log.recent(1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut log = AlertLog::new();
        for seq in 0..3 {
            log.push(alert(seq));
        }
        log.clear();

        assert!(log.is_empty());
        assert!(log.recent(0).is_empty());
        assert!(log.recent(20).is_empty());
    }
}
