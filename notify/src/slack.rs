//! Slack webhook notifier.
//!
//! Each severity can post to its own incoming webhook. When no per-severity
//! URL is configured, the shared `webhook_url` receives all three. Severities
//! without a webhook are dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chainwatch_types::{Event, EventCategory, Severity};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{Notifier, NotifyError};

/// Timeout for a single webhook post.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Fallback webhook used for every severity when none of the
    /// per-severity URLs is set.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub warn: Option<String>,
    #[serde(default)]
    pub critical: Option<String>,
}

impl SlackConfig {
    /// Whether no webhook at all is configured.
    pub fn is_empty(&self) -> bool {
        [&self.webhook_url, &self.info, &self.warn, &self.critical]
            .into_iter()
            .all(|url| url.as_deref().map_or(true, |u| u.trim().is_empty()))
    }

    /// Resolve the webhook for each severity.
    pub fn routes(&self) -> BTreeMap<Severity, String> {
        let non_empty = |url: &Option<String>| {
            url.as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
        };
        let per_level = [
            (Severity::Info, non_empty(&self.info)),
            (Severity::Warn, non_empty(&self.warn)),
            (Severity::Critical, non_empty(&self.critical)),
        ];

        if per_level.iter().all(|(_, url)| url.is_none()) {
            return match non_empty(&self.webhook_url) {
                Some(url) => Severity::ALL.into_iter().map(|s| (s, url.clone())).collect(),
                None => BTreeMap::new(),
            };
        }

        per_level
            .into_iter()
            .filter_map(|(severity, url)| url.map(|u| (severity, u)))
            .collect()
    }
}

/// Posts event batches to Slack incoming webhooks.
pub struct SlackNotifier {
    http_client: reqwest::Client,
    routes: BTreeMap<Severity, String>,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self, NotifyError> {
        if config.is_empty() {
            return Err(NotifyError::SlackNotConfigured);
        }
        let http_client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            routes: config.routes(),
        })
    }

    async fn send(&self, severity: Severity, events: &[&Event]) {
        let Some(url) = self.routes.get(&severity) else {
            return;
        };
        debug!(severity = %severity, count = events.len(), "sending slack message");
        let body = serde_json::json!({ "text": render_message(events) });
        match self.http_client.post(url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                error!(severity = %severity, status = %response.status(), "slack rejected message");
            }
            Ok(_) => {}
            Err(e) => error!(severity = %severity, "slack error: {e}"),
        }
    }
}

/// Group events by severity, dropping severities without a route.
pub fn group_by_severity<'a>(
    events: &'a [Event],
    routes: &BTreeMap<Severity, String>,
) -> BTreeMap<Severity, Vec<&'a Event>> {
    let mut grouped: BTreeMap<Severity, Vec<&Event>> = BTreeMap::new();
    for event in events {
        if !routes.contains_key(&event.severity) {
            debug!(severity = %event.severity, "no slack route, dropping event");
            continue;
        }
        grouped.entry(event.severity).or_default().push(event);
    }
    grouped
}

/// Message body: every event rendered with its metadata, separated by a blank line.
pub fn render_message(events: &[&Event]) -> String {
    events
        .iter()
        .map(|e| e.render())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, events: &[Event]) {
        let grouped = group_by_severity(events, &self.routes);
        join_all(
            grouped
                .iter()
                .map(|(severity, batch)| self.send(*severity, batch)),
        )
        .await;
    }

    async fn critical(&self, message: &str) {
        if !self.routes.contains_key(&Severity::Critical) {
            warn!("no slack webhook url set for critical events");
            return;
        }
        let event = Event::critical(EventCategory::Other, message);
        self.send(Severity::Critical, &[&event]).await;
    }
}
