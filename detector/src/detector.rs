//! The per-block analysis pipeline.

use std::sync::Arc;

use chainwatch_notify::Notifier;
use chainwatch_rpc::{RpcError, ValidatorSource};
use chainwatch_types::{Block, Event, EventCategory, Validator};
use tracing::{debug, info, warn};

use crate::cadence::CadenceTracker;
use crate::signatures::missing_signatures;
use crate::validators::{diff_validator_sets, watched_unbonded};
use crate::{DetectorConfig, EventLedger, RunningCadence};

/// Stateful analyzer fed one block at a time.
///
/// Owns all running state: previous block time and cadence, the last
/// validator snapshot and the event ledger. Callers serialize access by
/// holding it behind a single task.
pub struct AnomalyDetector {
    config: DetectorConfig,
    source: Arc<dyn ValidatorSource>,
    notifier: Arc<dyn Notifier>,
    cadence: CadenceTracker,
    previous_validators: Option<Vec<Validator>>,
    ledger: EventLedger,
}

impl AnomalyDetector {
    pub fn new(
        config: DetectorConfig,
        source: Arc<dyn ValidatorSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            notifier,
            cadence: CadenceTracker::new(),
            previous_validators: None,
            ledger: EventLedger::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn cadence(&self) -> RunningCadence {
        self.cadence.cadence()
    }

    pub fn previous_validators(&self) -> Option<&[Validator]> {
        self.previous_validators.as_deref()
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    /// Run every enabled check on `block`, dispatch the resulting batch and
    /// return it.
    pub async fn analyze_block(&mut self, block: &Block) -> Vec<Event> {
        info!(height = block.height, "parsing block");

        if self.config.has_event(EventCategory::Cadence) {
            let events = self.cadence.observe(
                block,
                self.config.block_speed_threshold_ms,
                self.config.block_speed_info_interval,
            );
            for event in events {
                self.ledger.add(event);
            }
        }

        if self.config.needs_validators() {
            match self.source.list_validators().await {
                Ok(validators) => self.check_validators(block, validators),
                Err(RpcError::NotConnected) => {
                    warn!(height = block.height, "validator query not ready, skipping validator checks");
                }
                Err(e) => {
                    warn!(height = block.height, "validator query failed, skipping validator checks: {e}");
                }
            }
        }

        let events = self.ledger.drain();
        if !events.is_empty() {
            debug!(height = block.height, count = events.len(), "dispatching events");
            self.notifier.notify(&events).await;
        }
        events
    }

    fn check_validators(&mut self, block: &Block, validators: Vec<Validator>) {
        let previous = self.previous_validators.take();
        if self.config.has_event(EventCategory::ValidatorSet) {
            match &previous {
                Some(previous) => {
                    for event in diff_validator_sets(previous, &validators) {
                        self.ledger.add(event);
                    }
                }
                None => debug!(count = validators.len(), "first validator snapshot stored"),
            }
        }

        if !self.config.watchlist.is_empty() {
            for event in watched_unbonded(&validators) {
                self.ledger.add_once(event);
            }
        }

        if self.config.has_event(EventCategory::Signatures) {
            for event in missing_signatures(block, &validators) {
                self.ledger.add(event);
            }
        }

        self.previous_validators = Some(validators);
    }
}
