//! Notification routing for chainwatch.
//!
//! The detection pipeline only knows the [`Notifier`] capability. Concrete
//! notifiers decide where each severity goes:
//! - [`SlackNotifier`] posts to per-severity Slack webhooks
//! - [`LogNotifier`] writes events to the structured log
//! - [`NotifierSet`] fans a batch out to several notifiers

pub mod error;
pub mod log;
pub mod notifier;
pub mod slack;

pub use error::NotifyError;
pub use log::LogNotifier;
pub use notifier::{Notifier, NotifierSet};
pub use slack::{SlackConfig, SlackNotifier};
