//! Validators as seen by the staking module.

use serde::{Deserialize, Serialize};

/// Staking bond status of a validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondStatus {
    Bonded,
    Unbonding,
    Unbonded,
}

impl BondStatus {
    pub fn is_bonded(&self) -> bool {
        matches!(self, Self::Bonded)
    }
}

/// A validator snapshot entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Bech32 operator address (`...valoper1...`), the identity used for diffing.
    pub operator_address: String,
    /// Uppercase hex consensus address, matches `CommitSignature::validator_address`.
    pub hex_address: String,
    pub moniker: String,
    pub status: BondStatus,
    pub jailed: bool,
    pub tokens: String,
    /// Whether the operator address is on the configured watchlist.
    pub watched: bool,
}

impl Validator {
    /// Moniker, or the operator address when the moniker is blank.
    pub fn display_name(&self) -> &str {
        if self.moniker.trim().is_empty() {
            &self.operator_address
        } else {
            &self.moniker
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(moniker: &str) -> Validator {
        Validator {
            operator_address: "cosmosvaloper1abc".into(),
            hex_address: "AB".repeat(20),
            moniker: moniker.into(),
            status: BondStatus::Bonded,
            jailed: false,
            tokens: "1000".into(),
            watched: false,
        }
    }

    #[test]
    fn display_name_prefers_moniker() {
        assert_eq!(validator("node-1").display_name(), "node-1");
    }

    #[test]
    fn display_name_falls_back_to_operator() {
        assert_eq!(validator("  ").display_name(), "cosmosvaloper1abc");
    }

    #[test]
    fn only_bonded_is_bonded() {
        assert!(BondStatus::Bonded.is_bonded());
        assert!(!BondStatus::Unbonding.is_bonded());
        assert!(!BondStatus::Unbonded.is_bonded());
    }
}
