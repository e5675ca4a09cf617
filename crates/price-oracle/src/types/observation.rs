use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::decimal::Price;

/// A recorded USD price for one whole token as of a given block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceObservation {
    pub token: Address,
    pub block: u64,
    pub price: Price,
}

impl PriceObservation {
    pub fn new(token: Address, block: u64, price: Price) -> Self {
        Self {
            token,
            block,
            price,
        }
    }
}

/// On-disk form of an observation, before the price precision is checked.
///
/// JSON numbers are read from their exact text, so `1843.12345678` written
/// as a number loses nothing on the way in.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawObservation {
    pub token: Address,
    pub block: u64,
    pub price: Decimal,
}

/// The observation selected for a lookup, with the token's decimals attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateResult {
    pub token: Address,
    pub block: u64,
    pub price: Price,
    pub decimals: u8,
}

impl RateResult {
    pub fn new(observation: &PriceObservation, decimals: u8) -> Self {
        Self {
            token: observation.token,
            block: observation.block,
            price: observation.price,
            decimals,
        }
    }
}

/// Result of converting a raw token amount into USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsdConversion {
    /// USD value of the converted amount.
    pub amount: BigDecimal,
    /// USD per whole token.
    pub price: Price,
}

/// Result of converting a USD amount into raw token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenConversion {
    /// Raw token units (scaled by the token's decimals).
    pub amount: BigUint,
    /// Whole tokens per USD.
    pub price: Decimal,
}
