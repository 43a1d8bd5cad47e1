//! chainwatch monitor: the orchestrator that wires every component together.
//!
//! [`Monitor`] owns two independent endpoint pools built from the same
//! configured addresses: one drives the `NewBlock` stream, the other the
//! validator query connection. Blocks flow from the stream ingestor through a
//! bounded channel into a single detector task, which dispatches event
//! batches to the configured notifiers.

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod shutdown;
pub mod spans;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use logging::{init_logging, LogFormat};
pub use monitor::{run_detector, Monitor, BLOCK_QUEUE_CAPACITY};
pub use shutdown::ShutdownController;
