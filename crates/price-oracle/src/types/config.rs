use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::ConfigError;

pub const DEFAULT_UPDATE_EVERY_MS: u64 = 10_000;
pub const DEFAULT_STORAGE_DIR: &str = "./data/prices";

/// Top-level oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleConfig {
    /// Maximum age of a chain's cached observations before they are reloaded.
    #[serde(default = "default_update_every_ms")]
    pub update_every_ms: u64,

    /// Root directory holding `{chainId}/prices.json` files.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

/// Per-chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,

    /// Carried for the indexing pipeline; unused by the oracle itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    #[serde(default)]
    pub tokens: Vec<TokenDescriptor>,
}

/// A priced token and its on-chain decimal precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub decimals: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl TokenDescriptor {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self {
            address,
            decimals,
            symbol: None,
        }
    }
}

fn default_update_every_ms() -> u64 {
    DEFAULT_UPDATE_EVERY_MS
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            update_every_ms: DEFAULT_UPDATE_EVERY_MS,
            storage_dir: default_storage_dir(),
            chains: Vec::new(),
        }
    }
}

impl OracleConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn update_every(&self) -> Duration {
        Duration::from_millis(self.update_every_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OracleConfig::from_json("{}").unwrap();
        assert_eq!(config.update_every(), Duration::from_millis(10_000));
        assert_eq!(config.storage_dir, PathBuf::from("./data/prices"));
        assert!(config.chains.is_empty());
    }

    #[test]
    fn test_parse_chains() {
        let json = r#"{
            "updateEveryMs": 2500,
            "storageDir": "/var/lib/prices",
            "chains": [
                {
                    "chainId": 10,
                    "rpcUrl": "https://mainnet.optimism.io",
                    "tokens": [
                        { "address": "0x4200000000000000000000000000000000000006", "decimals": 18, "symbol": "WETH" },
                        { "address": "0x0B2C639C533813F4AA9D7837CAF62653D097FF85", "decimals": 6 }
                    ]
                }
            ]
        }"#;

        let config = OracleConfig::from_json(json).unwrap();
        assert_eq!(config.update_every_ms, 2500);
        assert_eq!(config.chains.len(), 1);
        let chain = &config.chains[0];
        assert_eq!(chain.chain_id, 10);
        assert_eq!(chain.tokens[0].symbol.as_deref(), Some("WETH"));
        assert_eq!(
            chain.tokens[1].address.to_string(),
            "0x0b2c639c533813f4aa9d7837caf62653d097ff85"
        );
    }

    #[test]
    fn test_invalid_address_rejected() {
        let json = r#"{ "chains": [ { "chainId": 1, "tokens": [ { "address": "0xabc", "decimals": 18 } ] } ] }"#;
        assert!(matches!(
            OracleConfig::from_json(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = OracleConfig::load("/nonexistent/oracle.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
