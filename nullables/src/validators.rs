//! Nullable validator source with scripted snapshots.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chainwatch_rpc::{RpcError, ValidatorSource};
use chainwatch_types::{BondStatus, Validator};

/// A validator source that answers from a script.
///
/// Queued snapshots are served first, one per call; once the queue is empty
/// the last served (or [`set`](Self::set)) snapshot repeats. A source created
/// with [`not_ready`](Self::not_ready) fails with [`RpcError::NotConnected`]
/// until a snapshot is provided.
#[derive(Default)]
pub struct NullValidatorSource {
    queue: Mutex<VecDeque<Vec<Validator>>>,
    current: Mutex<Option<Vec<Validator>>>,
    calls: Mutex<usize>,
}

impl NullValidatorSource {
    /// A source that always returns `validators`.
    pub fn new(validators: Vec<Validator>) -> Self {
        Self {
            current: Mutex::new(Some(validators)),
            ..Self::default()
        }
    }

    /// A source that is not connected yet.
    pub fn not_ready() -> Self {
        Self::default()
    }

    /// Serve these snapshots in order, one per call.
    pub fn scripted(snapshots: impl IntoIterator<Item = Vec<Validator>>) -> Self {
        Self {
            queue: Mutex::new(snapshots.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Replace the repeating snapshot and drop anything still queued.
    pub fn set(&self, validators: Vec<Validator>) {
        lock(&self.queue).clear();
        *lock(&self.current) = Some(validators);
    }

    /// Number of `list_validators` calls so far.
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }

    /// Build a validator for fixtures.
    pub fn validator(operator: &str, hex: &str, moniker: &str, status: BondStatus) -> Validator {
        Validator {
            operator_address: operator.to_string(),
            hex_address: hex.to_string(),
            moniker: moniker.to_string(),
            status,
            jailed: false,
            tokens: "1000000".to_string(),
            watched: false,
        }
    }
}

#[async_trait]
impl ValidatorSource for NullValidatorSource {
    async fn list_validators(&self) -> Result<Vec<Validator>, RpcError> {
        *lock(&self.calls) += 1;
        if let Some(next) = lock(&self.queue).pop_front() {
            *lock(&self.current) = Some(next);
        }
        lock(&self.current)
            .clone()
            .ok_or(RpcError::NotConnected)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: usize) -> Vec<Validator> {
        (0..n)
            .map(|i| {
                NullValidatorSource::validator(
                    &format!("valoper{i}"),
                    &format!("{i:040X}"),
                    &format!("v{i}"),
                    BondStatus::Bonded,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn not_ready_until_set() {
        let source = NullValidatorSource::not_ready();
        assert!(matches!(
            source.list_validators().await,
            Err(RpcError::NotConnected)
        ));
        source.set(snapshot(2));
        assert_eq!(source.list_validators().await.unwrap().len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn scripted_snapshots_then_repeat_last() {
        let source = NullValidatorSource::scripted([snapshot(1), snapshot(3)]);
        assert_eq!(source.list_validators().await.unwrap().len(), 1);
        assert_eq!(source.list_validators().await.unwrap().len(), 3);
        assert_eq!(source.list_validators().await.unwrap().len(), 3);
    }
}
