//! Nullable notifier that records instead of delivering.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chainwatch_notify::Notifier;
use chainwatch_types::Event;

/// A notifier that keeps every batch and every critical message in memory.
#[derive(Default)]
pub struct NullNotifier {
    batches: Mutex<Vec<Vec<Event>>>,
    criticals: Mutex<Vec<String>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivered batch, in delivery order.
    pub fn batches(&self) -> Vec<Vec<Event>> {
        lock(&self.batches).clone()
    }

    /// All delivered events, flattened across batches.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.batches).iter().flatten().cloned().collect()
    }

    /// Messages passed to [`Notifier::critical`].
    pub fn criticals(&self) -> Vec<String> {
        lock(&self.criticals).clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.batches).clear();
        lock(&self.criticals).clear();
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, events: &[Event]) {
        if events.is_empty() {
            return;
        }
        lock(&self.batches).push(events.to_vec());
    }

    async fn critical(&self, message: &str) {
        lock(&self.criticals).push(message.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_types::{EventCategory, Severity};

    #[tokio::test]
    async fn records_batches_and_criticals_separately() {
        let notifier = NullNotifier::new();
        notifier
            .notify(&[
                Event::info(EventCategory::Cadence, "a"),
                Event::warn(EventCategory::Signatures, "b"),
            ])
            .await;
        notifier.notify(&[]).await;
        notifier.critical("down").await;

        assert_eq!(notifier.batches().len(), 1);
        assert_eq!(notifier.events()[1].severity, Severity::Warn);
        assert_eq!(notifier.criticals(), vec!["down".to_string()]);

        notifier.clear();
        assert!(notifier.events().is_empty());
        assert!(notifier.criticals().is_empty());
    }
}
