//! Anomaly detection over the block stream.
//!
//! [`AnomalyDetector::analyze_block`] runs once per block. Depending on the
//! enabled categories it checks block cadence, pulls a validator snapshot and
//! diffs it against the previous one, flags watched validators that left the
//! bonded set, and reports missed commit signatures. Events are collected in
//! an [`EventLedger`] and dispatched as one batch per block.

pub mod cadence;
pub mod config;
pub mod detector;
pub mod ledger;
pub mod signatures;
pub mod validators;

pub use cadence::{CadenceTracker, RunningCadence};
pub use config::DetectorConfig;
pub use detector::AnomalyDetector;
pub use ledger::EventLedger;
