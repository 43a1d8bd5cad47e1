//! Per-cycle event collection with deduplication and a permanent blacklist.

use std::collections::HashSet;

use chainwatch_crypto::event_key;
use chainwatch_types::{Event, EventKey};
use tracing::debug;

/// Events collected during one block's analysis.
///
/// Distinct events keep their insertion order. The blacklist outlives
/// [`drain`](Self::drain): an event added with [`add_once`](Self::add_once)
/// is never accepted again for the life of the ledger.
#[derive(Debug, Default)]
pub struct EventLedger {
    pending: Vec<Event>,
    seen: HashSet<EventKey>,
    blacklist: HashSet<EventKey>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event unless an identical one is already queued this cycle.
    pub fn add(&mut self, event: Event) -> bool {
        if !self.seen.insert(event_key(&event)) {
            return false;
        }
        debug!(category = %event.category, severity = event.severity.as_str(), "{}", event.text);
        self.pending.push(event);
        true
    }

    /// Queue a one-shot event and blacklist it.
    pub fn add_once(&mut self, event: Event) -> bool {
        let key = event_key(&event);
        if !self.blacklist.insert(key) {
            debug!(%key, "blacklisted event suppressed");
            return false;
        }
        self.add(event)
    }

    /// Take this cycle's events and start a new cycle.
    pub fn drain(&mut self) -> Vec<Event> {
        self.seen.clear();
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Event] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_types::EventCategory;

    fn warn(text: &str) -> Event {
        Event::warn(EventCategory::ValidatorSet, text)
    }

    #[test]
    fn duplicates_within_a_cycle_collapse() {
        let mut ledger = EventLedger::new();
        assert!(ledger.add(warn("a")));
        assert!(!ledger.add(warn("a")));
        assert!(ledger.add(warn("b")));
        assert_eq!(ledger.drain(), vec![warn("a"), warn("b")]);
    }

    #[test]
    fn metadata_is_part_of_identity() {
        let mut ledger = EventLedger::new();
        assert!(ledger.add(warn("a").with_meta("height", 1u64)));
        assert!(ledger.add(warn("a").with_meta("height", 2u64)));
        assert_eq!(ledger.pending().len(), 2);
    }

    #[test]
    fn drain_starts_a_fresh_cycle() {
        let mut ledger = EventLedger::new();
        ledger.add(warn("a"));
        ledger.drain();
        assert!(ledger.add(warn("a")));
    }

    #[test]
    fn once_events_never_return() {
        let mut ledger = EventLedger::new();
        assert!(ledger.add_once(warn("gone")));
        assert_eq!(ledger.drain().len(), 1);
        assert!(!ledger.add_once(warn("gone")));
        assert!(ledger.drain().is_empty());
    }

    #[test]
    fn plain_add_is_not_blacklisted() {
        let mut ledger = EventLedger::new();
        ledger.add(warn("x"));
        ledger.drain();
        assert!(ledger.add_once(warn("x")));
        assert_eq!(ledger.drain(), vec![warn("x")]);
    }
}
