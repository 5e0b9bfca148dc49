//! Genesis configuration
//!
//! Describes the metadata, owner and initial allocations a ledger is created
//! with. Configs are plain JSON so hosts can keep them next to the snapshot.

use crate::ledger::address::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Decimal places of the TRD token
pub const TRD_DECIMALS: u8 = 18;
/// Whole-token allocation of the first genesis holder
pub const TRD_FIRST_ALLOCATION: u128 = 12_200_000_000;
/// Whole-token allocation of the second genesis holder
pub const TRD_SECOND_ALLOCATION: u128 = 7_800_000_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Invalid owner: the zero address cannot own the ledger")]
    InvalidOwner,
    #[error("Invalid allocation: the zero address cannot hold funds")]
    InvalidHolder,
    #[error("Invalid allocation: total supply overflows")]
    SupplyOverflow,
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Initial balance assigned at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub holder: Address,
    #[serde(with = "crate::ledger::event::amount_string")]
    pub amount: u128,
}

/// Ledger genesis parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Display name (e.g., "Trade.mn")
    pub name: String,
    /// Display symbol (e.g., "TRD")
    pub symbol: String,
    /// Decimal places of one whole token
    pub decimals: u8,
    /// Owner account
    pub owner: Address,
    /// Initial balances, in base units
    pub allocations: Vec<Allocation>,
}

impl LedgerConfig {
    /// The TRD genesis: 20 billion tokens split 12.2bn / 7.8bn
    pub fn trd(owner: Address, first: Address, second: Address) -> Self {
        Self {
            name: "Trade.mn".to_string(),
            symbol: "TRD".to_string(),
            decimals: TRD_DECIMALS,
            owner,
            allocations: vec![
                Allocation {
                    holder: first,
                    amount: to_base_units(TRD_FIRST_ALLOCATION, TRD_DECIMALS),
                },
                Allocation {
                    holder: second,
                    amount: to_base_units(TRD_SECOND_ALLOCATION, TRD_DECIMALS),
                },
            ],
        }
    }

    /// Validate metadata and allocations
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() || self.name.len() > 50 {
            return Err(ConfigError::InvalidName);
        }

        if self.symbol.is_empty() || self.symbol.len() > 10 {
            return Err(ConfigError::InvalidSymbol);
        }

        if self.decimals > 18 {
            return Err(ConfigError::InvalidDecimals);
        }

        if self.owner.is_zero() {
            return Err(ConfigError::InvalidOwner);
        }

        if self.allocations.iter().any(|a| a.holder.is_zero()) {
            return Err(ConfigError::InvalidHolder);
        }

        self.initial_supply()?;

        Ok(())
    }

    /// Sum of all allocations
    pub fn initial_supply(&self) -> Result<u128, ConfigError> {
        self.allocations.iter().try_fold(0u128, |total, a| {
            total
                .checked_add(a.amount)
                .ok_or(ConfigError::SupplyOverflow)
        })
    }

    /// Load a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: LedgerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Scale a whole-token amount to base units.
///
/// Saturates at `u128::MAX`.
pub fn to_base_units(whole: u128, decimals: u8) -> u128 {
    whole.saturating_mul(10u128.saturating_pow(decimals as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trd_config() -> LedgerConfig {
        LedgerConfig::trd(
            Address::from_label("owner"),
            Address::from_label("first"),
            Address::from_label("second"),
        )
    }

    #[test]
    fn test_trd_genesis() {
        let config = trd_config();

        assert_eq!(config.name, "Trade.mn");
        assert_eq!(config.symbol, "TRD");
        assert_eq!(config.decimals, 18);
        assert_eq!(
            config.initial_supply().unwrap(),
            to_base_units(20_000_000_000, 18)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = trd_config();
        config.name = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidName)));

        let mut config = trd_config();
        config.symbol = "TOOLONGSYMBOL".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSymbol)));

        let mut config = trd_config();
        config.decimals = 19;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDecimals)));

        let mut config = trd_config();
        config.owner = Address::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidOwner)));

        let mut config = trd_config();
        config.allocations[0].holder = Address::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHolder)));

        let mut config = trd_config();
        config.allocations[0].amount = u128::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::SupplyOverflow)));
    }

    #[test]
    fn test_file_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("genesis.json");
        let config = trd_config();

        config.save(&path).unwrap();
        assert_eq!(LedgerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_base_units() {
        assert_eq!(to_base_units(1, 18), 1_000_000_000_000_000_000);
        assert_eq!(to_base_units(5, 0), 5);
        assert_eq!(to_base_units(u128::MAX, 18), u128::MAX);
    }
}
