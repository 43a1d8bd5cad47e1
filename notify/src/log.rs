//! Notifier that writes events to the structured log.

use async_trait::async_trait;
use chainwatch_types::{Event, Severity};
use tracing::{error, info, warn};

use crate::Notifier;

/// Logs each event at the level matching its severity.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, events: &[Event]) {
        for event in events {
            let category = event.category.config_name();
            match event.severity {
                Severity::Info => info!(category, "{}", event.render()),
                Severity::Warn => warn!(category, "{}", event.render()),
                Severity::Critical => error!(category, "{}", event.render()),
            }
        }
    }
}
