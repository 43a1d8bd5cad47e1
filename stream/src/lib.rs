//! Streaming block ingestion.
//!
//! [`StreamIngestor`] keeps one WebSocket subscription to `NewBlock` events
//! open at a time, rotating through its endpoint pool on failure. Every
//! decoded [`Block`](chainwatch_types::Block) is pushed into a bounded channel
//! consumed by the detector. A watchdog raises a critical liveness alert when
//! blocks stop arriving.

pub mod error;
pub mod frame;
pub mod ingestor;
pub mod watchdog;

pub use error::StreamError;
pub use frame::{parse_frame, subscribe_request, NEW_BLOCK_QUERY};
pub use ingestor::{StreamIngestor, RECONNECT_DELAY, SUBSCRIBE_DELAY};
pub use watchdog::{stall_alert, StallPolicy, WatchdogGuard, STALL_THRESHOLD, WATCHDOG_INTERVAL};
