//! Consensus address derivation.
//!
//! The staking module returns the consensus key wrapped in a protobuf `Any`
//! whose value is itself a one-field `PubKey { bytes key = 1 }` message, so
//! the raw key starts after a 2-byte field tag/length prefix. The address is
//! the first 20 bytes of SHA-256 over the raw key, rendered as uppercase hex.

use sha2::{Digest, Sha256};

/// Length of the tag/length prefix in front of the raw key bytes.
pub const PUBKEY_PREFIX_LEN: usize = 2;

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Derive the uppercase hex consensus address from an encoded consensus key.
///
/// Inputs shorter than the prefix hash as an empty key; they cannot match any
/// real commit signature.
pub fn consensus_address(encoded_pubkey: &[u8]) -> String {
    let raw = encoded_pubkey.get(PUBKEY_PREFIX_LEN..).unwrap_or_default();
    let digest = Sha256::digest(raw);
    hex::encode_upper(&digest[..ADDRESS_LEN])
}
