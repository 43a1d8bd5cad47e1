//! Round-robin endpoint pool with pool-wide hold backoff.

use std::future::Future;
use std::time::Duration;

use chainwatch_notify::Notifier;
use tracing::{error, info};

use crate::NetworkError;

/// Upper bound for a single connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after every endpoint in the pool has failed once.
pub const HOLD_DURATION: Duration = Duration::from_secs(60);

/// What a recorded failure means for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Other endpoints in this round are still untried.
    Retry,
    /// A full round has failed; the pool must hold before retrying.
    Exhausted,
}

/// Ordered endpoint addresses with an active cursor and failure counter.
///
/// Invariant: `active < addresses.len()`, guaranteed by rejecting empty pools.
#[derive(Clone, Debug)]
pub struct EndpointPool {
    name: String,
    addresses: Vec<String>,
    active: usize,
    consecutive_failures: usize,
    hold_duration: Duration,
}

impl EndpointPool {
    /// Create a pool. `name` only labels logs and alerts ("stream", "rpc").
    pub fn new(name: impl Into<String>, addresses: Vec<String>) -> Result<Self, NetworkError> {
        let name = name.into();
        let addresses: Vec<String> = addresses
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if addresses.is_empty() {
            return Err(NetworkError::EmptyPool(name));
        }
        Ok(Self {
            name,
            addresses,
            active: 0,
            consecutive_failures: 0,
            hold_duration: HOLD_DURATION,
        })
    }

    /// Override the hold duration.
    pub fn with_hold_duration(mut self, hold: Duration) -> Self {
        self.hold_duration = hold;
        self
    }

    /// The active endpoint address.
    pub fn current(&self) -> &str {
        &self.addresses[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Advance the cursor to the next endpoint, wrapping around.
    pub fn rotate(&mut self) -> &str {
        self.active = (self.active + 1) % self.addresses.len();
        info!(pool = %self.name, endpoint = %self.current(), "rotating endpoint");
        self.current()
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a failure. Returns [`FailureOutcome::Exhausted`] when the counter
    /// reaches the pool size; the counter stays there until
    /// [`finish_hold`](Self::finish_hold).
    pub fn record_failure(&mut self) -> FailureOutcome {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.addresses.len() {
            FailureOutcome::Exhausted
        } else {
            FailureOutcome::Retry
        }
    }

    /// End a hold: the next round starts with a clean counter.
    pub fn finish_hold(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failure and, if the round is exhausted, raise a critical alert,
    /// wait out the hold and reset the counter.
    ///
    /// Returns `true` if a hold took place.
    pub async fn register_failure(&mut self, notifier: &dyn Notifier) -> bool {
        if self.record_failure() == FailureOutcome::Retry {
            return false;
        }
        self.hold(notifier).await;
        true
    }

    /// Alert critical, sleep for the hold duration, then reset the counter.
    pub async fn hold(&mut self, notifier: &dyn Notifier) {
        let msg = format!(
            "All {} endpoints failed, trying again in {} seconds",
            self.name,
            self.hold_duration.as_secs()
        );
        error!(pool = %self.name, "{msg}");
        notifier.critical(&msg).await;
        tokio::time::sleep(self.hold_duration).await;
        self.finish_hold();
    }
}

/// Run a connection attempt against `endpoint`, bounded by [`CONNECT_TIMEOUT`].
pub async fn with_connect_timeout<F, T, E>(endpoint: &str, attempt: F) -> Result<T, NetworkError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(CONNECT_TIMEOUT, attempt).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(NetworkError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(NetworkError::ConnectTimeout {
            endpoint: endpoint.to_string(),
            timeout: CONNECT_TIMEOUT,
        }),
    }
}
