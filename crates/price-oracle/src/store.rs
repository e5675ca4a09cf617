use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::decimal::Price;
use crate::error::StoreError;
use crate::types::observation::{PriceObservation, RawObservation};

/// File name of a chain's observation list inside its storage directory.
pub const PRICES_FILE: &str = "prices.json";

/// Source of recorded price observations (filesystem, database, in-memory, etc.).
///
/// Implementations must return, for any single token, observations in
/// non-decreasing block order. Ordering across tokens is unconstrained.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Load every recorded observation for a chain.
    async fn load(&self, chain_id: u64) -> Result<Vec<PriceObservation>, StoreError>;
}

/// Reads `{storage_dir}/{chain_id}/prices.json`.
#[derive(Debug, Clone)]
pub struct FsPriceStore {
    storage_dir: PathBuf,
}

impl FsPriceStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Path of the observation file for a chain.
    pub fn prices_path(&self, chain_id: u64) -> PathBuf {
        self.storage_dir
            .join(chain_id.to_string())
            .join(PRICES_FILE)
    }
}

#[async_trait]
impl PriceStore for FsPriceStore {
    async fn load(&self, chain_id: u64) -> Result<Vec<PriceObservation>, StoreError> {
        let path = self.prices_path(chain_id);
        debug!(chain_id, path = %path.display(), "reading price file");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        let raw: Vec<RawObservation> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        raw.into_iter().map(validate_observation).collect()
    }
}

fn validate_observation(raw: RawObservation) -> Result<PriceObservation, StoreError> {
    let price = Price::try_from_decimal(raw.price).map_err(|err| StoreError::InvalidPrice {
        token: raw.token,
        block: raw.block,
        reason: err.to_string(),
    })?;
    Ok(PriceObservation::new(raw.token, raw.block, price))
}

/// Static in-memory price store for testing and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceStore {
    prices: HashMap<u64, Vec<PriceObservation>>,
}

impl StaticPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation to a chain's list.
    pub fn insert(&mut self, chain_id: u64, observation: PriceObservation) {
        self.prices.entry(chain_id).or_default().push(observation);
    }

    /// Replace a chain's list wholesale.
    pub fn set(&mut self, chain_id: u64, observations: Vec<PriceObservation>) {
        self.prices.insert(chain_id, observations);
    }
}

#[async_trait]
impl PriceStore for StaticPriceStore {
    async fn load(&self, chain_id: u64) -> Result<Vec<PriceObservation>, StoreError> {
        Ok(self.prices.get(&chain_id).cloned().unwrap_or_default())
    }
}
