pub mod address;
pub mod cache;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod store;
pub mod token;
pub mod types;

use std::path::Path;

use error::ConfigError;

// Re-exports for convenience
pub use address::Address;
pub use bigdecimal::BigDecimal;
pub use decimal::{Price, INVERSE_PRICE_DECIMALS, PRICE_DECIMALS};
pub use engine::ConversionEngine;
pub use error::Error;
pub use lookup::BoundaryRule;
pub use rust_decimal::Decimal;
pub use store::{FsPriceStore, PriceStore, StaticPriceStore};
pub use token::TokenRegistry;
pub use types::config::{ChainConfig, OracleConfig, TokenDescriptor};
pub use types::observation::{PriceObservation, RateResult, TokenConversion, UsdConversion};

/// Load a configuration file and build an engine over its storage directory.
///
/// This is the main entry point for indexers: one engine per process, shared
/// by every handler that needs USD conversions.
pub fn load_engine(config_path: impl AsRef<Path>) -> Result<ConversionEngine, ConfigError> {
    let config = OracleConfig::load(config_path)?;
    ConversionEngine::from_config(&config)
}
