//! Blake2b hashing for event keys.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chainwatch_types::{Event, EventKey};

type Blake2b256 = Blake2b<U32>;

/// Blake2b-256 over the concatenation of `parts`, fed without copying.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    parts
        .iter()
        .fold(Blake2b256::new(), |hasher, part| hasher.chain_update(part))
        .finalize()
        .into()
}

/// Structural key of an event: category, severity, text and sorted metadata,
/// NUL-separated.
pub fn event_key(event: &Event) -> EventKey {
    let metadata = event
        .metadata
        .as_ref()
        .and_then(|m| serde_json::to_vec(m).ok())
        .unwrap_or_default();
    EventKey::new(blake2b_256_multi(&[
        event.category.config_name().as_bytes(),
        &[0],
        event.severity.as_str().as_bytes(),
        &[0],
        event.text.as_bytes(),
        &[0],
        &metadata,
    ]))
}
