use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("slack config is not set: provide a webhook url or per-severity urls")]
    SlackNotConfigured,

    #[error("HTTP client error: {0}")]
    Client(String),
}
