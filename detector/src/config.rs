//! Detector settings.

use std::collections::{BTreeSet, HashSet};

use chainwatch_types::EventCategory;

/// Default allowed deviation from the average block time.
pub const DEFAULT_BLOCK_SPEED_THRESHOLD_MS: u64 = 1000;

/// Default number of blocks between cadence info events.
pub const DEFAULT_BLOCK_SPEED_INFO_INTERVAL: u64 = 100;

/// What the detector checks and how strictly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    pub events: BTreeSet<EventCategory>,
    /// Operator addresses of watched validators.
    pub watchlist: HashSet<String>,
    pub block_speed_threshold_ms: u64,
    /// Emit a cadence info event when `height % interval == 0`.
    pub block_speed_info_interval: u64,
}

impl DetectorConfig {
    pub fn new(events: impl IntoIterator<Item = EventCategory>) -> Self {
        Self {
            events: events.into_iter().collect(),
            watchlist: HashSet::new(),
            block_speed_threshold_ms: DEFAULT_BLOCK_SPEED_THRESHOLD_MS,
            block_speed_info_interval: DEFAULT_BLOCK_SPEED_INFO_INTERVAL,
        }
    }

    pub fn with_watchlist(mut self, watchlist: impl IntoIterator<Item = String>) -> Self {
        self.watchlist = watchlist.into_iter().collect();
        self
    }

    pub fn with_threshold_ms(mut self, threshold: u64) -> Self {
        self.block_speed_threshold_ms = threshold;
        self
    }

    pub fn with_info_interval(mut self, interval: u64) -> Self {
        self.block_speed_info_interval = interval;
        self
    }

    pub fn has_event(&self, category: EventCategory) -> bool {
        self.events.contains(&category)
    }

    pub fn has_any_event(&self, categories: &[EventCategory]) -> bool {
        categories.iter().any(|c| self.has_event(*c))
    }

    /// Whether a block needs a validator snapshot at all.
    pub fn needs_validators(&self) -> bool {
        self.has_any_event(&[EventCategory::ValidatorSet, EventCategory::Signatures])
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new(EventCategory::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators_needed_only_for_validator_categories() {
        assert!(!DetectorConfig::new([EventCategory::Cadence]).needs_validators());
        assert!(DetectorConfig::new([EventCategory::Signatures]).needs_validators());
        assert!(DetectorConfig::new([EventCategory::ValidatorSet]).needs_validators());
    }

    #[test]
    fn defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.block_speed_threshold_ms, 1000);
        assert_eq!(config.block_speed_info_interval, 100);
        assert!(config.watchlist.is_empty());
        assert!(config.has_event(EventCategory::Liveness));
    }
}
