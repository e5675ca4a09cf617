use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::Error;

/// Implied fractional digits carried by every recorded USD price.
pub const PRICE_DECIMALS: u32 = 8;

/// Fractional digits of the token-per-USD rate returned by inverse conversions.
pub const INVERSE_PRICE_DECIMALS: u32 = 18;

/// USD value of one whole token, fixed at [`PRICE_DECIMALS`] fractional digits.
///
/// Equality is numeric, so a price parsed from `"2"` equals one parsed from
/// `"2.00000000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Build a price from raw units of `10^-8` USD.
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(units), PRICE_DECIMALS))
    }

    /// Rejects negative values and values with more than eight significant
    /// fractional digits. Nothing is rounded.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::InvalidDecimal(format!("{value}: negative price")));
        }
        let mut price = value.normalize();
        if price.scale() > PRICE_DECIMALS {
            return Err(Error::InvalidDecimal(format!(
                "{value}: more than {PRICE_DECIMALS} fractional digits"
            )));
        }
        price.rescale(PRICE_DECIMALS);
        if price.scale() != PRICE_DECIMALS {
            return Err(Error::InvalidDecimal(format!(
                "{value}: too many digits for {PRICE_DECIMALS} fractional places"
            )));
        }
        Ok(Self(price.abs()))
    }

    /// Raw units of `10^-8` USD.
    pub fn units(&self) -> BigUint {
        BigUint::from(self.0.mantissa().unsigned_abs())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Token-per-USD rate, rounded half up to [`INVERSE_PRICE_DECIMALS`] digits.
    /// `None` for a zero price.
    pub fn inverse(&self) -> Option<Decimal> {
        Decimal::ONE.checked_div(self.0).map(|rate| {
            rate.round_dp_with_strategy(
                INVERSE_PRICE_DECIMALS,
                RoundingStrategy::MidpointAwayFromZero,
            )
        })
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s.trim())
            .map_err(|e| Error::InvalidDecimal(format!("{s}: {e}")))?;
        Self::try_from_decimal(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let price: Price = "2".parse().unwrap();
        assert_eq!(price, "2.00000000".parse().unwrap());
        assert_eq!(price.to_string(), "2");
        assert_eq!("1843.50".parse::<Price>().unwrap().to_string(), "1843.5");
        assert_eq!(price.as_decimal().scale(), PRICE_DECIMALS);
    }

    #[test]
    fn test_parse_rejects_out_of_range_prices() {
        for bad in ["", "abc", "-1", "0.000000001", "1.2.3"] {
            assert!(bad.parse::<Price>().is_err(), "{bad} should fail");
        }
        // Trailing zeros past the eighth digit carry no information.
        assert!("0.100000000000".parse::<Price>().is_ok());
    }

    #[test]
    fn test_units() {
        let price: Price = "2".parse().unwrap();
        assert_eq!(price.units(), BigUint::from(200_000_000u64));
        assert_eq!(Price::from_units(1), "0.00000001".parse().unwrap());
    }

    #[test]
    fn test_inverse_rounds_half_up() {
        let price = |s: &str| s.parse::<Price>().unwrap();
        assert_eq!(price("2").inverse().unwrap(), dec("0.5"));
        assert_eq!(
            price("3").inverse().unwrap().to_string(),
            "0.333333333333333333"
        );
        assert_eq!(
            price("1.5").inverse().unwrap().to_string(),
            "0.666666666666666667"
        );
        assert!(Price::from_units(0).inverse().is_none());
    }
}
