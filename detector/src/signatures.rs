//! Missed commit signatures.

use std::collections::HashMap;

use chainwatch_types::{Block, Event, EventCategory, Validator};

/// Match the block's non-committed signatures against a validator snapshot.
///
/// Returns an info event for every matched validator and, when any of them
/// is watched, a separate warn event for the watched subset. Signatures
/// with an empty or unknown address are skipped.
pub fn missing_signatures(block: &Block, validators: &[Validator]) -> Vec<Event> {
    let by_address: HashMap<&str, &Validator> = validators
        .iter()
        .filter(|v| !v.hex_address.is_empty())
        .map(|v| (v.hex_address.as_str(), v))
        .collect();

    let missed: Vec<&Validator> = block
        .missed_signatures()
        .filter(|s| !s.validator_address.is_empty())
        .filter_map(|s| by_address.get(s.validator_address.as_str()).copied())
        .collect();
    if missed.is_empty() {
        return Vec::new();
    }

    let mut events = vec![Event::info(
        EventCategory::Signatures,
        format!("Found {} missing signatures in block {}", missed.len(), block.height),
    )
    .with_meta("validators", display_names(&missed))];

    let watched: Vec<&Validator> = missed.iter().copied().filter(|v| v.watched).collect();
    if !watched.is_empty() {
        events.push(
            Event::warn(
                EventCategory::Signatures,
                format!(
                    "Found {} missing signatures from watched validators in block {}",
                    watched.len(),
                    block.height
                ),
            )
            .with_meta("validators", display_names(&watched)),
        );
    }
    events
}

fn display_names(validators: &[&Validator]) -> Vec<String> {
    validators.iter().map(|v| v.display_name().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_types::{BlockIdFlag, BondStatus, CommitSignature, MetaValue, Severity, Timestamp};

    fn v(hex: &str, moniker: &str, watched: bool) -> Validator {
        Validator {
            operator_address: format!("valoper-{moniker}"),
            hex_address: hex.into(),
            moniker: moniker.into(),
            status: BondStatus::Bonded,
            jailed: false,
            tokens: "1".into(),
            watched,
        }
    }

    fn sig(addr: &str, flag: u8) -> CommitSignature {
        CommitSignature {
            validator_address: addr.into(),
            flag: BlockIdFlag::from(flag),
        }
    }

    fn block(signatures: Vec<CommitSignature>) -> Block {
        Block::new(42, Timestamp::from_millis(0), signatures)
    }

    #[test]
    fn committed_signatures_are_fine() {
        let set = vec![v("AA", "a", true)];
        assert!(missing_signatures(&block(vec![sig("AA", 2)]), &set).is_empty());
    }

    #[test]
    fn absent_and_nil_count_as_missed() {
        let set = vec![v("AA", "a", false), v("BB", "b", false), v("CC", "c", false)];
        let events = missing_signatures(&block(vec![sig("AA", 1), sig("BB", 3), sig("CC", 2)]), &set);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Info);
        assert_eq!(events[0].text, "Found 2 missing signatures in block 42");
        assert_eq!(
            events[0].metadata.as_ref().unwrap()["validators"],
            MetaValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn unknown_addresses_are_excluded() {
        let set = vec![v("AA", "a", false)];
        let events = missing_signatures(&block(vec![sig("AA", 1), sig("ZZ", 1), sig("", 1)]), &set);
        assert_eq!(events[0].text, "Found 1 missing signatures in block 42");
        assert!(missing_signatures(&block(vec![sig("ZZ", 1)]), &set).is_empty());
    }

    #[test]
    fn empty_address_never_matches() {
        let set = vec![v("", "keyless", true)];
        assert!(missing_signatures(&block(vec![sig("", 1)]), &set).is_empty());
    }

    #[test]
    fn watched_subset_gets_its_own_warning() {
        let set = vec![v("AA", "a", false), v("BB", "b", true)];
        let events = missing_signatures(&block(vec![sig("AA", 1), sig("BB", 1)]), &set);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].severity, Severity::Warn);
        assert_eq!(
            events[1].text,
            "Found 1 missing signatures from watched validators in block 42"
        );
        assert_eq!(
            events[1].metadata.as_ref().unwrap()["validators"],
            MetaValue::List(vec!["b".into()])
        );
    }
}
