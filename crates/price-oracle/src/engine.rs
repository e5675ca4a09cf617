use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;

use crate::address::Address;
use crate::cache::{Observations, PriceCache};
use crate::decimal::PRICE_DECIMALS;
use crate::error::{ConfigError, Error};
use crate::lookup::{BoundaryRule, LookupPolicy};
use crate::store::{FsPriceStore, PriceStore};
use crate::token::TokenRegistry;
use crate::types::config::OracleConfig;
use crate::types::observation::{RateResult, TokenConversion, UsdConversion};

/// Converts between raw token amounts and USD using recorded historical prices.
///
/// Each engine owns its own price cache; share the engine (e.g. behind an
/// `Arc`) rather than building one per caller.
pub struct ConversionEngine {
    lookup: LookupPolicy,
}

impl ConversionEngine {
    pub fn new(
        registry: TokenRegistry,
        store: Arc<dyn PriceStore>,
        update_every: Duration,
    ) -> Self {
        let cache = PriceCache::new(store, update_every);
        Self {
            lookup: LookupPolicy::new(registry, cache),
        }
    }

    /// Build an engine reading price files from the configured storage directory.
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        let registry = TokenRegistry::from_chains(&config.chains)?;
        let store = Arc::new(FsPriceStore::new(config.storage_dir.clone()));
        Ok(Self::new(registry, store, config.update_every()))
    }

    /// Match in-range blocks with `rule` instead of the default strict-before rule.
    pub fn with_boundary_rule(self, rule: BoundaryRule) -> Self {
        Self {
            lookup: self.lookup.with_boundary_rule(rule),
        }
    }

    pub fn registry(&self) -> &TokenRegistry {
        self.lookup.registry()
    }

    /// The rate applicable to `token` at `block` (latest when `block` is `None`).
    pub async fn get_usd_conversion_rate(
        &self,
        chain_id: u64,
        token: &Address,
        block: Option<u64>,
    ) -> Result<RateResult, Error> {
        self.lookup.resolve(chain_id, token, block).await
    }

    /// Convert raw token units to USD. The returned price is USD per token.
    pub async fn convert_to_usd(
        &self,
        chain_id: u64,
        token: &Address,
        amount: &BigUint,
        block: Option<u64>,
    ) -> Result<UsdConversion, Error> {
        let rate = self.lookup.resolve(chain_id, token, block).await?;
        Ok(UsdConversion {
            amount: usd_value(amount, &rate),
            price: rate.price,
        })
    }

    /// Convert a USD amount to raw token units. The returned price is tokens
    /// per USD, the inverse of the recorded rate.
    pub async fn convert_from_usd(
        &self,
        chain_id: u64,
        token: &Address,
        usd: &BigDecimal,
        block: Option<u64>,
    ) -> Result<TokenConversion, Error> {
        if usd.sign() == Sign::Minus {
            return Err(Error::NegativeAmount(usd.clone()));
        }
        let rate = self.lookup.resolve(chain_id, token, block).await?;
        let zero_price = || Error::ZeroPrice {
            chain_id,
            token: *token,
        };
        let amount = token_amount(usd, &rate).ok_or_else(zero_price)?;
        let price = rate.price.inverse().ok_or_else(zero_price)?;
        Ok(TokenConversion { amount, price })
    }

    /// Every observation recorded for the chain, unfiltered.
    pub async fn get_all_prices_for_chain(&self, chain_id: u64) -> Result<Observations, Error> {
        self.lookup.observations(chain_id).await
    }
}

/// `amount / 10^decimals * price`, exact: the product keeps every digit and
/// the decimal point is placed last.
pub fn usd_value(amount: &BigUint, rate: &RateResult) -> BigDecimal {
    let digits = BigInt::from(amount * rate.price.units());
    let scale = i64::from(rate.decimals) + i64::from(PRICE_DECIMALS);
    BigDecimal::new(digits, scale).normalized()
}

/// `usd / price * 10^decimals`, rounded half up to a whole token unit.
/// `None` when the price is zero or `usd` is negative.
pub fn token_amount(usd: &BigDecimal, rate: &RateResult) -> Option<BigUint> {
    if rate.price.is_zero() || usd.sign() == Sign::Minus {
        return None;
    }
    // usd = digits * 10^-exponent; the exponent is negative for normalised
    // values with trailing integer zeros.
    let (digits, exponent) = usd.as_bigint_and_exponent();
    let shift = u32::try_from(exponent.unsigned_abs()).ok()?;
    let mut numerator = digits.magnitude() * pow10(u32::from(rate.decimals) + PRICE_DECIMALS);
    let mut denominator = rate.price.units();
    if exponent >= 0 {
        denominator *= pow10(shift);
    } else {
        numerator *= pow10(shift);
    }

    let (quotient, remainder) = numerator.div_rem(&denominator);
    if remainder * 2u32 >= denominator {
        Some(quotient + 1u32)
    } else {
        Some(quotient)
    }
}

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}
