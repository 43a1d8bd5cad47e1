//! Validator set changes between two snapshots.

use std::collections::HashMap;

use chainwatch_types::{Event, EventCategory, Validator};

/// Compare two snapshots by operator address.
///
/// Returns at most three events: additions (info), transitions into the
/// bonded set (info) and transitions out of it (warn). A validator that is
/// new in `current` only counts as added, whatever its status.
pub fn diff_validator_sets(previous: &[Validator], current: &[Validator]) -> Vec<Event> {
    let before: HashMap<&str, &Validator> = previous
        .iter()
        .map(|v| (v.operator_address.as_str(), v))
        .collect();

    let mut added = Vec::new();
    let mut bonded = Vec::new();
    let mut unbonded = Vec::new();
    for validator in current {
        match before.get(validator.operator_address.as_str()) {
            None => added.push(format!("New validator added: {}", validator.display_name())),
            Some(prev) if validator.status.is_bonded() && !prev.status.is_bonded() => {
                bonded.push(format!("New validator bonded: {}", validator.display_name()));
            }
            Some(prev) if !validator.status.is_bonded() && prev.status.is_bonded() => {
                unbonded.push(format!("Validator unbonded: {}", validator.display_name()));
            }
            Some(_) => {}
        }
    }

    let mut events = Vec::new();
    if !added.is_empty() {
        events.push(Event::info(EventCategory::ValidatorSet, added.join("\n")));
    }
    if !bonded.is_empty() {
        events.push(Event::info(EventCategory::ValidatorSet, bonded.join("\n")));
    }
    if !unbonded.is_empty() {
        events.push(Event::warn(EventCategory::ValidatorSet, unbonded.join("\n")));
    }
    events
}

/// One event per watched validator outside the bonded set.
pub fn watched_unbonded(current: &[Validator]) -> Vec<Event> {
    current
        .iter()
        .filter(|v| v.watched && !v.status.is_bonded())
        .map(|v| {
            Event::warn(
                EventCategory::ValidatorSet,
                format!("Watched validator \"{}\" is unbonded", v.display_name()),
            )
            .with_meta("operatorAddress", v.operator_address.as_str())
        })
        .collect()
}
