//! Shared utilities for chainwatch.

pub mod time;

pub use time::{format_duration, format_millis_as_secs};
