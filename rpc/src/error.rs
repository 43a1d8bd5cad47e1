//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("query client is not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("ABCI query failed with code {code}: {log}")]
    Abci { code: u32, log: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] chainwatch_network::NetworkError),
}

impl RpcError {
    /// Whether the failure means the connection itself is unusable.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Status(_))
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RpcError::Timeout
        } else if e.is_decode() {
            RpcError::InvalidResponse(e.to_string())
        } else {
            RpcError::Transport(e.to_string())
        }
    }
}

impl From<prost::DecodeError> for RpcError {
    fn from(e: prost::DecodeError) -> Self {
        RpcError::InvalidResponse(format!("protobuf: {e}"))
    }
}

impl From<base64::DecodeError> for RpcError {
    fn from(e: base64::DecodeError) -> Self {
        RpcError::InvalidResponse(format!("base64: {e}"))
    }
}
