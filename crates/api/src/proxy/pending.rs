//! Per-tunnel tracking of frames still waiting for an answer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a tracked request may wait for its answer.
pub const PENDING_TTL: Duration = Duration::from_secs(5);

/// Request ids sent upstream and the instant each one expires.
#[derive(Debug)]
pub struct PendingRequests {
    ttl: Duration,
    deadlines: HashMap<String, Instant>,
}

impl PendingRequests {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            deadlines: HashMap::new(),
        }
    }

    /// Start (or restart) the clock for `request_id`.
    pub fn track(&mut self, request_id: String, now: Instant) {
        self.deadlines.insert(request_id, now + self.ttl);
    }

    /// Forget an answered request. Returns `false` if it was not pending.
    pub fn resolve(&mut self, request_id: &str) -> bool {
        self.deadlines.remove(request_id).is_some()
    }

    /// Remove and return every request whose deadline has passed, oldest first.
    pub fn evict_expired(&mut self, now: Instant) -> Vec<String> {
        let mut expired: Vec<(String, Instant)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (id.clone(), *deadline))
            .collect();
        expired.sort_by_key(|(_, deadline)| *deadline);

        for (id, _) in &expired {
            self.deadlines.remove(id);
        }
        expired.into_iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new(PENDING_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_requests_never_expire() {
        let start = Instant::now();
        let mut pending = PendingRequests::default();
        pending.track("a".into(), start);
        assert!(pending.resolve("a"));
        assert!(!pending.resolve("a"));
        assert!(pending.evict_expired(start + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn evicts_only_past_deadline() {
        let start = Instant::now();
        let mut pending = PendingRequests::default();
        pending.track("old".into(), start);
        pending.track("new".into(), start + Duration::from_secs(3));

        assert!(pending.evict_expired(start + Duration::from_secs(4)).is_empty());
        assert_eq!(pending.evict_expired(start + Duration::from_secs(5)), vec!["old"]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.evict_expired(start + Duration::from_secs(9)), vec!["new"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn retracking_restarts_the_clock() {
        let start = Instant::now();
        let mut pending = PendingRequests::default();
        pending.track("r".into(), start);
        pending.track("r".into(), start + Duration::from_secs(4));
        assert!(pending.evict_expired(start + Duration::from_secs(6)).is_empty());
        assert_eq!(pending.evict_expired(start + Duration::from_secs(9)), vec!["r"]);
    }
}
