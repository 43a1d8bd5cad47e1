//! Block cadence tracking.

use chainwatch_types::{Block, Event, EventCategory, Timestamp};
use chainwatch_utils::format_millis_as_secs;
use tracing::debug;

/// Streaming mean of block intervals.
///
/// `sample_count` counts observed blocks: 1 after the first block, 2 once
/// the average has been seeded from the first interval.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningCadence {
    pub average_ms: f64,
    pub sample_count: u64,
}

impl RunningCadence {
    /// Fold one interval into the average using the pre-increment count.
    pub fn update(&mut self, delta_ms: f64) {
        let n = self.sample_count as f64;
        self.average_ms = (self.average_ms * n + delta_ms) / (n + 1.0);
        self.sample_count += 1;
    }
}

/// Previous block time plus the running cadence.
#[derive(Clone, Debug, Default)]
pub struct CadenceTracker {
    previous: Option<Timestamp>,
    cadence: RunningCadence,
}

impl CadenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cadence(&self) -> RunningCadence {
        self.cadence
    }

    pub fn previous(&self) -> Option<Timestamp> {
        self.previous
    }

    /// Feed one block; returns the cadence events it triggers.
    pub fn observe(&mut self, block: &Block, threshold_ms: u64, info_interval: u64) -> Vec<Event> {
        let Some(previous) = self.previous else {
            debug!(height = block.height, "first block tracked");
            self.previous = Some(block.time);
            self.cadence.sample_count = 1;
            return Vec::new();
        };

        let delta_ms = block.time.millis_since(previous) as f64;
        if self.cadence.sample_count < 2 {
            debug!(height = block.height, delta_ms, "first two blocks tracked");
            self.previous = Some(block.time);
            self.cadence = RunningCadence {
                average_ms: delta_ms,
                sample_count: 2,
            };
            return Vec::new();
        }

        let average_ms = self.cadence.average_ms;
        let speed = format_millis_as_secs(delta_ms);
        let average = format_millis_as_secs(average_ms);
        let mut events = Vec::new();

        if info_interval > 0 && block.height % info_interval == 0 {
            events.push(
                Event::info(
                    EventCategory::Cadence,
                    format!("Block {} speed: {speed}, average: {average}", block.height),
                )
                .with_meta("height", block.height),
            );
        }
        if (delta_ms - average_ms).abs() > threshold_ms as f64 {
            events.push(
                Event::warn(
                    EventCategory::Cadence,
                    format!("Block speed is {speed}, average is {average}"),
                )
                .with_meta("height", block.height),
            );
        }

        self.cadence.update(delta_ms);
        self.previous = Some(block.time);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_types::Severity;
    use proptest::prelude::*;

    const T0: i64 = 1_700_000_000_000;

    fn block(height: u64, offset_ms: i64) -> Block {
        Block::new(height, Timestamp::from_millis(T0 + offset_ms), Vec::new())
    }

    #[test]
    fn cold_start_and_seed_emit_nothing() {
        let mut tracker = CadenceTracker::new();
        assert!(tracker.observe(&block(1, 0), 1000, 100).is_empty());
        assert_eq!(tracker.cadence().sample_count, 1);
        assert!(tracker.observe(&block(2, 6000), 1000, 100).is_empty());
        assert_eq!(
            tracker.cadence(),
            RunningCadence {
                average_ms: 6000.0,
                sample_count: 2
            }
        );
    }

    #[test]
    fn deviation_at_threshold_is_quiet() {
        let mut tracker = CadenceTracker::new();
        tracker.observe(&block(1, 0), 1000, 100);
        tracker.observe(&block(2, 1000), 1000, 100);
        // delta 0, average 1000: |0 - 1000| is not above the threshold.
        assert!(tracker.observe(&block(3, 1000), 1000, 100).is_empty());
    }

    #[test]
    fn deviation_above_threshold_warns_once() {
        let mut tracker = CadenceTracker::new();
        tracker.observe(&block(1, 0), 1000, 100);
        tracker.observe(&block(2, 6000), 1000, 100);
        let events = tracker.observe(&block(3, 14_500), 1000, 100);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warn);
        assert_eq!(events[0].text, "Block speed is 8.50s, average is 6.00s");
    }

    #[test]
    fn average_uses_pre_increment_count() {
        let mut tracker = CadenceTracker::new();
        tracker.observe(&block(1, 0), 1000, 100);
        tracker.observe(&block(2, 6000), 1000, 100);
        tracker.observe(&block(3, 15_000), 1000, 100);
        // (6000 * 2 + 9000) / 3
        assert_eq!(tracker.cadence().average_ms, 7000.0);
        assert_eq!(tracker.cadence().sample_count, 3);
    }

    #[test]
    fn info_fires_on_interval_even_without_warn() {
        let mut tracker = CadenceTracker::new();
        tracker.observe(&block(98, 0), 1000, 100);
        tracker.observe(&block(99, 6000), 1000, 100);
        let events = tracker.observe(&block(100, 12_000), 1000, 100);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Info);
        assert_eq!(events[0].text, "Block 100 speed: 6.00s, average: 6.00s");
        assert_eq!(
            events[0].metadata.as_ref().unwrap()["height"],
            chainwatch_types::MetaValue::Number(100)
        );
    }

    #[test]
    fn info_and_warn_fire_together() {
        let mut tracker = CadenceTracker::new();
        tracker.observe(&block(8, 0), 1000, 10);
        tracker.observe(&block(9, 6000), 1000, 10);
        let events = tracker.observe(&block(10, 20_000), 1000, 10);
        let severities: Vec<_> = events.iter().map(|e| e.severity).collect();
        assert_eq!(severities, [Severity::Info, Severity::Warn]);
    }

    #[test]
    fn repeated_block_follows_stored_state() {
        let mut tracker = CadenceTracker::new();
        let b = block(5, 0);
        assert!(tracker.observe(&b, 1000, 100).is_empty());
        assert!(tracker.observe(&b, 1000, 100).is_empty());
        assert_eq!(
            tracker.cadence(),
            RunningCadence {
                average_ms: 0.0,
                sample_count: 2
            }
        );
    }

    proptest! {
        /// Info fires exactly on multiples of the interval.
        #[test]
        fn info_iff_height_divisible(height in 3u64..10_000, interval in 1u64..500) {
            let mut tracker = CadenceTracker::new();
            tracker.observe(&block(height - 2, 0), 1000, interval);
            tracker.observe(&block(height - 1, 6000), 1000, interval);
            let events = tracker.observe(&block(height, 12_000), 1000, interval);
            let infos = events.iter().filter(|e| e.severity == Severity::Info).count();
            prop_assert_eq!(infos == 1, height % interval == 0);
        }
    }
}
