//! Monitor configuration with TOML file support.

use std::collections::BTreeSet;
use std::path::Path;

use chainwatch_detector::DetectorConfig;
use chainwatch_notify::SlackConfig;
use chainwatch_types::EventCategory;
use serde::Deserialize;
use tracing::info;

use crate::{LogFormat, MonitorError};

/// Configuration for the monitor.
///
/// Can be loaded from a TOML file via [`MonitorConfig::from_toml_file`],
/// assembled from CLI flags and environment variables by the daemon, or
/// built programmatically for tests. Call [`validate`](Self::validate)
/// before starting.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MonitorConfig {
    /// WebSocket endpoints, tried in order.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Operator addresses of watched validators.
    #[serde(default)]
    pub validators_watchlist: Vec<String>,

    /// Enabled event categories: `other`, `chain`, `block_speed`,
    /// `validator_set`, `signatures`.
    #[serde(default)]
    pub events: Vec<String>,

    /// Allowed deviation (ms) from the average block time before warning.
    #[serde(default = "default_block_speed_threshold")]
    pub block_speed_threshold_ms: u64,

    /// Emit a block speed info event every this many blocks.
    #[serde(default = "default_block_speed_info_interval")]
    pub block_speed_info_interval: u64,

    #[serde(default)]
    pub slack: SlackConfig,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_block_speed_threshold() -> u64 {
    chainwatch_detector::config::DEFAULT_BLOCK_SPEED_THRESHOLD_MS
}

fn default_block_speed_info_interval() -> u64 {
    chainwatch_detector::config::DEFAULT_BLOCK_SPEED_INFO_INTERVAL
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, MonitorError> {
        toml::from_str(s).map_err(|e| MonitorError::Config(e.to_string()))
    }

    /// Check everything the monitor needs before it can start.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(MonitorError::Config(
                "at least one endpoint is required".to_string(),
            ));
        }
        if self.events.iter().all(|e| e.trim().is_empty()) {
            return Err(MonitorError::Config(
                "at least one event category is required".to_string(),
            ));
        }
        self.event_categories()?;
        if self.block_speed_info_interval == 0 {
            return Err(MonitorError::Config(
                "block_speed_info_interval must be greater than zero".to_string(),
            ));
        }
        self.log_format.parse::<LogFormat>()?;
        Ok(())
    }

    /// Parse the configured event names.
    pub fn event_categories(&self) -> Result<BTreeSet<EventCategory>, MonitorError> {
        self.events
            .iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| {
                e.parse::<EventCategory>().map_err(|_| {
                    let available: Vec<_> =
                        EventCategory::ALL.iter().map(|c| c.config_name()).collect();
                    MonitorError::Config(format!(
                        "invalid event {:?}, available events: {}",
                        e.trim(),
                        available.join(", ")
                    ))
                })
            })
            .collect()
    }

    pub fn has_event(&self, category: EventCategory) -> bool {
        self.event_categories()
            .map(|set| set.contains(&category))
            .unwrap_or(false)
    }

    pub fn has_any_event(&self, categories: &[EventCategory]) -> bool {
        categories.iter().any(|c| self.has_event(*c))
    }

    /// Endpoints with surrounding whitespace and empty entries removed.
    pub fn endpoint_list(&self) -> Vec<String> {
        clean_list(&self.endpoints)
    }

    pub fn watchlist(&self) -> Vec<String> {
        clean_list(&self.validators_watchlist)
    }

    pub fn log_format(&self) -> Result<LogFormat, MonitorError> {
        self.log_format.parse()
    }

    /// Detector settings derived from this configuration.
    pub fn detector_config(&self) -> Result<DetectorConfig, MonitorError> {
        Ok(DetectorConfig::new(self.event_categories()?)
            .with_watchlist(self.watchlist())
            .with_threshold_ms(self.block_speed_threshold_ms)
            .with_info_interval(self.block_speed_info_interval))
    }

    /// Log the effective configuration. Webhook URLs are reported only as
    /// set or unset.
    pub fn log_summary(&self) {
        let routed: Vec<_> = self
            .slack
            .routes()
            .keys()
            .map(|s| s.as_str())
            .collect();
        info!(
            endpoints = ?self.endpoint_list(),
            validators = ?self.watchlist(),
            events = ?self.events,
            block_speed_threshold_ms = self.block_speed_threshold_ms,
            block_speed_info_interval = self.block_speed_info_interval,
            slack_severities = ?routed,
            "effective configuration"
        );
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            validators_watchlist: Vec::new(),
            events: Vec::new(),
            block_speed_threshold_ms: default_block_speed_threshold(),
            block_speed_info_interval: default_block_speed_info_interval(),
            slack: SlackConfig::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
