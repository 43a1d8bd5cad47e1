//! The notifier capability and a fan-out combinator.

use std::sync::Arc;

use async_trait::async_trait;
use chainwatch_types::{Event, EventCategory};

/// Delivers batches of events somewhere outside the process.
///
/// Implementations own their failure handling: delivery errors are logged and
/// never returned to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a batch of events, routed by severity.
    async fn notify(&self, events: &[Event]);

    /// Shortcut for system-level faults that bypass the detector.
    async fn critical(&self, message: &str) {
        self.notify(&[Event::critical(EventCategory::Other, message)])
            .await;
    }
}

/// Forwards every call to each contained notifier, in order.
#[derive(Clone, Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifiers.push(notifier);
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    async fn notify(&self, events: &[Event]) {
        if events.is_empty() {
            return;
        }
        for notifier in &self.notifiers {
            notifier.notify(events).await;
        }
    }

    async fn critical(&self, message: &str) {
        for notifier in &self.notifiers {
            notifier.critical(message).await;
        }
    }
}
