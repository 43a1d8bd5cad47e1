use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("endpoint pool {0} has no addresses")]
    EmptyPool(String),

    #[error("connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },
}
