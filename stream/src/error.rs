use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("network error: {0}")]
    Network(#[from] chainwatch_network::NetworkError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("subscription request could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
