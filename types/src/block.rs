//! Blocks as delivered by the `NewBlock` subscription.
//!
//! Only the fields the detector needs are kept: height, header time and the
//! previous block's commit signatures. The wire shape is the Tendermint /
//! CometBFT JSON block; [`Block`] deserializes from it directly.

use serde::{Deserialize, Deserializer};

use crate::{Timestamp, TypesError};

/// Per-validator indicator of whether a signature made it into a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockIdFlag {
    /// The validator did not vote.
    Absent,
    /// The validator voted for the committed block.
    Commit,
    /// The validator voted nil.
    Nil,
    /// Any flag value this build does not know about.
    Other(u8),
}

impl BlockIdFlag {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Commit)
    }
}

impl From<u8> for BlockIdFlag {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Absent,
            2 => Self::Commit,
            3 => Self::Nil,
            other => Self::Other(other),
        }
    }
}

/// One entry of a block's `last_commit.signatures` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSignature {
    /// Uppercase hex consensus address, empty for absent votes on most nodes.
    pub validator_address: String,
    pub flag: BlockIdFlag,
}

/// A block observed on the stream. Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub height: u64,
    pub time: Timestamp,
    pub signatures: Vec<CommitSignature>,
}

impl Block {
    pub fn new(height: u64, time: Timestamp, signatures: Vec<CommitSignature>) -> Self {
        Self {
            height,
            time,
            signatures,
        }
    }

    /// Signatures whose flag is anything but `Commit`.
    pub fn missed_signatures(&self) -> impl Iterator<Item = &CommitSignature> {
        self.signatures.iter().filter(|s| !s.flag.is_committed())
    }
}

// ── Wire shape ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawBlock {
    header: RawHeader,
    #[serde(default)]
    last_commit: Option<RawCommit>,
}

#[derive(Deserialize)]
struct RawHeader {
    #[serde(deserialize_with = "height_from_string_or_number")]
    height: u64,
    time: String,
}

#[derive(Deserialize)]
struct RawCommit {
    #[serde(default)]
    signatures: Vec<RawSignature>,
}

#[derive(Deserialize)]
struct RawSignature {
    block_id_flag: u8,
    #[serde(default)]
    validator_address: Option<String>,
}

impl TryFrom<RawBlock> for Block {
    type Error = TypesError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let time = Timestamp::parse_rfc3339(&raw.header.time)?;
        let signatures = raw
            .last_commit
            .map(|c| c.signatures)
            .unwrap_or_default()
            .into_iter()
            .map(|s| CommitSignature {
                validator_address: s.validator_address.unwrap_or_default().to_uppercase(),
                flag: BlockIdFlag::from(s.block_id_flag),
            })
            .collect();
        Ok(Block {
            height: raw.header.height,
            time,
            signatures,
        })
    }
}

fn height_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Text(String),
        Number(u64),
    }

    match Height::deserialize(deserializer)? {
        Height::Number(n) => Ok(n),
        Height::Text(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(TypesError::InvalidHeight(s))),
    }
}
