use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] chainwatch_network::NetworkError),

    #[error("notifier error: {0}")]
    Notify(#[from] chainwatch_notify::NotifyError),

    #[error("task failed: {0}")]
    Task(String),
}
