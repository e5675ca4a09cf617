use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::address::Address;

/// Unified error type for price lookups and conversions.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The token is not configured for the chain, or the chain has no
    /// configured tokens at all.
    #[error("unknown token {address} on chain {chain_id}")]
    UnknownToken { chain_id: u64, address: Address },

    #[error("no prices recorded for token {token} on chain {chain_id}")]
    NoPricesFound { chain_id: u64, token: Address },

    #[error("no price found for token {token} on chain {chain_id} at block {block}")]
    PriceNotFound {
        chain_id: u64,
        token: Address,
        block: u64,
    },

    #[error("price of token {token} on chain {chain_id} is zero, cannot invert")]
    ZeroPrice { chain_id: u64, token: Address },

    #[error("price store error: {0}")]
    Store(#[from] Arc<StoreError>),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("USD amount {0} is negative")]
    NegativeAmount(bigdecimal::BigDecimal),
}

/// Errors raised while loading recorded observations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid price for token {token} at block {block}: {reason}")]
    InvalidPrice {
        token: Address,
        block: u64,
        reason: String,
    },
}

/// Errors raised while loading oracle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("chain {0} is configured more than once")]
    DuplicateChain(u64),

    #[error("token {address} is configured more than once on chain {chain_id}")]
    DuplicateToken { chain_id: u64, address: Address },
}
