//! Errors raised while building domain values from external input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid block height: {0}")]
    InvalidHeight(String),

    #[error("unknown event category: {0}")]
    UnknownCategory(String),
}
