//! Hashing helpers for chainwatch.
//!
//! - **SHA-256** for deriving a validator's consensus address from its
//!   consensus public key, the same address that appears in commit signatures
//! - **Blake2b** for structural event keys used by deduplication and the
//!   one-shot blacklist

pub mod address;
pub mod hash;

pub use address::{consensus_address, ADDRESS_LEN, PUBKEY_PREFIX_LEN};
pub use hash::{blake2b_256_multi, event_key};
