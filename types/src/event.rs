//! Classified monitoring events.
//!
//! Events are plain values: two events with the same category, severity,
//! text and metadata are the same event. Deduplication and the one-shot
//! blacklist key on that structure via [`EventKey`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// What kind of anomaly an event reports.
///
/// Configuration refers to categories by their historical names
/// (`chain`, `block_speed`, ...), see [`EventCategory::config_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Chain liveness (no blocks arriving).
    #[serde(rename = "chain")]
    Liveness,
    /// Block cadence drift.
    #[serde(rename = "block_speed")]
    Cadence,
    #[serde(rename = "validator_set")]
    ValidatorSet,
    #[serde(rename = "signatures")]
    Signatures,
    /// System-level conditions such as endpoint exhaustion.
    #[serde(rename = "other")]
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 5] = [
        Self::Other,
        Self::Liveness,
        Self::Cadence,
        Self::ValidatorSet,
        Self::Signatures,
    ];

    /// Name used in configuration and in serialized events.
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::Liveness => "chain",
            Self::Cadence => "block_speed",
            Self::ValidatorSet => "validator_set",
            Self::Signatures => "signatures",
            Self::Other => "other",
        }
    }
}

impl FromStr for EventCategory {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.config_name() == trimmed)
            .ok_or_else(|| TypesError::UnknownCategory(trimmed.to_string()))
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

/// Severity, in increasing order of urgency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Info, Self::Warn, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata value attached to an event.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(u64),
    Text(String),
    List(Vec<String>),
}

impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Event metadata. Sorted by key so the structural identity of an event does
/// not depend on insertion order.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A single classified event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub category: EventCategory,
    pub severity: Severity,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Event {
    pub fn new(category: EventCategory, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            text: text.into(),
            metadata: None,
        }
    }

    pub fn info(category: EventCategory, text: impl Into<String>) -> Self {
        Self::new(category, Severity::Info, text)
    }

    pub fn warn(category: EventCategory, text: impl Into<String>) -> Self {
        Self::new(category, Severity::Warn, text)
    }

    pub fn critical(category: EventCategory, text: impl Into<String>) -> Self {
        Self::new(category, Severity::Critical, text)
    }

    /// Attach one metadata entry, replacing any previous value for `key`.
    pub fn with_meta(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Text followed by pretty-printed metadata, as delivered to chat channels.
    pub fn render(&self) -> String {
        match &self.metadata {
            Some(meta) if !meta.is_empty() => {
                let pretty = serde_json::to_string_pretty(meta).unwrap_or_default();
                format!("{}\n{}", self.text, pretty)
            }
            _ => self.text.clone(),
        }
    }
}

/// Structural identity of an [`Event`], a Blake2b-256 digest over category,
/// severity, text and sorted metadata.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey([u8; 32]);

impl EventKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKey(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
