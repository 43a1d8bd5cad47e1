//! Liveness watchdog.
//!
//! Runs beside the read loop while a session is connected. Every tick it
//! compares wall-clock time with the header time of the last observed block
//! and alerts critical when the chain looks stalled. The alert repeats on every
//! tick for as long as the stall lasts.

use std::sync::Arc;
use std::time::Duration;

use chainwatch_notify::Notifier;
use chainwatch_types::{Event, EventCategory, Timestamp};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

/// Time between watchdog checks.
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(30);

/// Age of the last block beyond which the chain is considered stalled.
pub const STALL_THRESHOLD: Duration = Duration::from_secs(30);

/// When the watchdog looks, and how old the last block may get before the
/// chain counts as stalled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StallPolicy {
    pub check_every: Duration,
    pub threshold: Duration,
}

impl Default for StallPolicy {
    fn default() -> Self {
        Self {
            check_every: WATCHDOG_INTERVAL,
            threshold: STALL_THRESHOLD,
        }
    }
}

/// Build the stall alert if the last block is older than `threshold`.
pub fn stall_alert(last_block: Timestamp, now: Timestamp, threshold: Duration) -> Option<Event> {
    let elapsed_ms = now.millis_since(last_block);
    if elapsed_ms <= i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX) {
        return None;
    }
    Some(Event::critical(
        EventCategory::Liveness,
        format!("No block in the last {}s", elapsed_ms / 1000),
    ))
}

/// Aborts the watchdog task when dropped, so a cancelled or finished session
/// never leaves a timer behind.
pub struct WatchdogGuard(JoinHandle<()>);

impl WatchdogGuard {
    /// Start the watchdog. The first check happens one interval from now.
    pub fn spawn(
        last_block: watch::Receiver<Option<Timestamp>>,
        notifier: Arc<dyn Notifier>,
        policy: StallPolicy,
    ) -> Self {
        debug!(?policy, "starting block liveness watchdog");
        let handle = tokio::spawn(async move {
            let every = policy.check_every;
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let last = *last_block.borrow();
                let Some(last) = last else {
                    continue;
                };
                if let Some(event) = stall_alert(last, Timestamp::now(), policy.threshold) {
                    error!("{}", event.text);
                    notifier.notify(&[event]).await;
                }
            }
        });
        Self(handle)
    }
}

impl Drop for WatchdogGuard {
    fn drop(&mut self) {
        debug!("stopping block liveness watchdog");
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_nullables::NullNotifier;
    use chainwatch_types::Severity;

    fn ms(v: i64) -> Timestamp {
        Timestamp::from_millis(v)
    }

    #[test]
    fn fresh_block_is_fine() {
        assert!(stall_alert(ms(100_000), ms(110_000), STALL_THRESHOLD).is_none());
    }

    #[test]
    fn exactly_threshold_is_fine() {
        assert!(stall_alert(ms(100_000), ms(130_000), STALL_THRESHOLD).is_none());
    }

    #[test]
    fn stale_block_raises_critical_liveness() {
        let event = stall_alert(ms(100_000), ms(145_500), STALL_THRESHOLD).expect("stall");
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.category, EventCategory::Liveness);
        assert_eq!(event.text, "No block in the last 45s");
    }

    #[test]
    fn threshold_is_configurable() {
        let threshold = Duration::from_secs(5);
        assert!(stall_alert(ms(100_000), ms(105_000), threshold).is_none());
        let event = stall_alert(ms(100_000), ms(106_200), threshold).expect("stall");
        assert_eq!(event.text, "No block in the last 6s");
    }

    #[test]
    fn future_block_time_is_not_a_stall() {
        assert!(stall_alert(ms(200_000), ms(100_000), STALL_THRESHOLD).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_repeats_while_stalled() {
        let stale = Timestamp::from_millis(Timestamp::now().as_millis() - 120_000);
        let (_tx, rx) = watch::channel(Some(stale));
        let notifier = Arc::new(NullNotifier::new());
        let _guard = WatchdogGuard::spawn(rx, notifier.clone(), StallPolicy::default());

        tokio::time::sleep(WATCHDOG_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(notifier.events().len(), 1);

        tokio::time::sleep(WATCHDOG_INTERVAL).await;
        assert_eq!(notifier.events().len(), 2);
        assert!(notifier
            .events()
            .iter()
            .all(|e| e.category == EventCategory::Liveness));
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_is_quiet_before_first_block() {
        let (_tx, rx) = watch::channel(None);
        let notifier = Arc::new(NullNotifier::new());
        let _guard = WatchdogGuard::spawn(rx, notifier.clone(), StallPolicy::default());
        tokio::time::sleep(WATCHDOG_INTERVAL * 3).await;
        assert!(notifier.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_guard_stops_alerts() {
        let stale = Timestamp::from_millis(Timestamp::now().as_millis() - 120_000);
        let (_tx, rx) = watch::channel(Some(stale));
        let notifier = Arc::new(NullNotifier::new());
        let guard = WatchdogGuard::spawn(rx, notifier.clone(), StallPolicy::default());
        drop(guard);
        tokio::time::sleep(WATCHDOG_INTERVAL * 3).await;
        assert!(notifier.events().is_empty());
    }
}
