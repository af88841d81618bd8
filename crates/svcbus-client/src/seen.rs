use std::collections::{HashSet, VecDeque};

/// A bounded, insertion-ordered set of `(thread, thread_trace, serial)` keys
/// used to drop redelivered duplicates.
///
/// The broker's delivery semantics are at-least-once: a reconnect may
/// redeliver an envelope the session already processed. `serial` is the
/// sender-assigned, monotonically increasing per-message counter carried on
/// the wire (see [`svcbus_protocol::Message::serial`]) — a genuine
/// redelivery carries the same serial as the first delivery, while two
/// distinct calls that happen to emit byte-identical content (e.g. two
/// `respond("x")` in a row) get different serials and are never confused
/// for duplicates. A plain growing `HashSet` would leak memory over a
/// long-lived session, so this evicts the oldest entry once `capacity` is
/// exceeded; callers keep at least 1024 live entries.
#[derive(Debug)]
pub(crate) struct SeenSet {
    capacity: usize,
    order: VecDeque<(String, u32, u32)>,
    seen: HashSet<(String, u32, u32)>,
}

impl SeenSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `true` if `(thread, thread_trace, serial)` has not been seen
    /// before, recording it. Returns `false` if it's a duplicate.
    pub(crate) fn insert_if_new(&mut self, thread: &str, thread_trace: u32, serial: u32) -> bool {
        let key = (thread.to_string(), thread_trace, serial);
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.seen.insert(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_is_new_second_is_duplicate() {
        let mut seen = SeenSet::new(1024);
        assert!(seen.insert_if_new("t-1", 0, 0));
        assert!(!seen.insert_if_new("t-1", 0, 0));
    }

    #[test]
    fn different_serial_same_trace_is_new() {
        let mut seen = SeenSet::new(1024);
        assert!(seen.insert_if_new("t-1", 0, 0));
        assert!(seen.insert_if_new("t-1", 0, 1));
    }

    #[test]
    fn identical_content_with_distinct_serials_is_never_deduped() {
        // Two `respond("x")` calls in a row emit byte-identical wire
        // content but distinct serials; the seen-set must not conflate
        // them even though a content-hash fingerprint would.
        let mut seen = SeenSet::new(1024);
        assert!(seen.insert_if_new("t-1", 5, 0));
        assert!(seen.insert_if_new("t-1", 5, 1));
    }

    #[test]
    fn eviction_forgets_the_oldest_entry() {
        let mut seen = SeenSet::new(2);
        assert!(seen.insert_if_new("t-1", 0, 0));
        assert!(seen.insert_if_new("t-1", 1, 1));
        assert!(seen.insert_if_new("t-1", 2, 2));
        assert!(seen.insert_if_new("t-1", 0, 0));
    }
}
