//! Nullable infrastructure for deterministic testing.
//!
//! The notifier and the validator query are the two seams where the monitor
//! touches the outside world. This crate provides test-friendly
//! implementations that:
//! - Record everything they are given
//! - Can be scripted programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod notifier;
pub mod validators;

pub use notifier::NullNotifier;
pub use validators::NullValidatorSource;
