use crate::errors::{ConfigError, PriceFeedError};
use bigdecimal::{
    num_bigint::{BigInt, Sign},
    BigDecimal, RoundingMode, Zero,
};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Decimal places between wei and gwei.
pub const GWEI_DECIMALS: i64 = 9;
/// Decimal places between wei and ether.
pub const ETHER_DECIMALS: i64 = 18;
/// Widest decimal exponent accepted from a price feed or a config file, in either direction.
/// A `U256` has at most 78 digits.
pub const MAX_DECIMAL_EXPONENT: i64 = 78;

/// How a value is cut down to the number of decimal places configured for its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Drop the extra digits (round toward zero).
    #[default]
    Truncate,
    Floor,
    Ceiling,
    HalfUp,
    HalfEven,
}

impl RoundingPolicy {
    pub fn mode(self) -> RoundingMode {
        match self {
            RoundingPolicy::Truncate => RoundingMode::Down,
            RoundingPolicy::Floor => RoundingMode::Floor,
            RoundingPolicy::Ceiling => RoundingMode::Ceiling,
            RoundingPolicy::HalfUp => RoundingMode::HalfUp,
            RoundingPolicy::HalfEven => RoundingMode::HalfEven,
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" | "down" => Ok(RoundingPolicy::Truncate),
            "floor" => Ok(RoundingPolicy::Floor),
            "ceiling" | "ceil" => Ok(RoundingPolicy::Ceiling),
            "half-up" => Ok(RoundingPolicy::HalfUp),
            "half-even" => Ok(RoundingPolicy::HalfEven),
            _ => Err(ConfigError::UnknownRounding(s.to_owned())),
        }
    }
}

/// Decimal places kept for each unit, plus the policy used to drop the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    pub wei: i64,
    pub gwei: i64,
    pub ether: i64,
    pub usd: i64,
    pub rounding: RoundingPolicy,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            wei: 0,
            gwei: GWEI_DECIMALS,
            ether: ETHER_DECIMALS,
            usd: 2,
            rounding: RoundingPolicy::Truncate,
        }
    }
}

/// Price of one ether in fiat currency. Always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExchangeRate(BigDecimal);

impl ExchangeRate {
    pub fn new(rate: BigDecimal) -> Result<Self, PriceFeedError> {
        if !is_within_exponent_range(&rate) {
            return Err(PriceFeedError::RateOutOfRange {
                scale: rate.as_bigint_and_exponent().1,
            });
        }
        if rate <= BigDecimal::zero() {
            return Err(PriceFeedError::NonPositiveRate(rate));
        }
        Ok(Self(rate))
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&plain(&self.0))
    }
}

/// Conversions between wei, gwei, ether and fiat.
///
/// Shifts between wei, gwei and ether are exact; the configured precision is only applied
/// to the value that comes out of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitConverter {
    precision: Precision,
}

impl UnitConverter {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    fn round(&self, value: &BigDecimal, places: i64) -> BigDecimal {
        value.with_scale_round(places, self.precision.rounding.mode())
    }

    pub fn wei(&self, value: &BigDecimal) -> BigDecimal {
        self.round(value, self.precision.wei)
    }

    pub fn gwei(&self, value: &BigDecimal) -> BigDecimal {
        self.round(value, self.precision.gwei)
    }

    pub fn ether(&self, value: &BigDecimal) -> BigDecimal {
        self.round(value, self.precision.ether)
    }

    pub fn usd(&self, value: &BigDecimal) -> BigDecimal {
        self.round(value, self.precision.usd)
    }

    pub fn wei_to_gwei(&self, wei: &BigDecimal) -> BigDecimal {
        self.gwei(&shift_right(wei, GWEI_DECIMALS))
    }

    pub fn wei_to_ether(&self, wei: &BigDecimal) -> BigDecimal {
        self.ether(&shift_right(wei, ETHER_DECIMALS))
    }

    pub fn gwei_to_wei(&self, gwei: &BigDecimal) -> BigDecimal {
        self.wei(&shift_right(gwei, -GWEI_DECIMALS))
    }

    pub fn ether_to_wei(&self, ether: &BigDecimal) -> BigDecimal {
        self.wei(&shift_right(ether, -ETHER_DECIMALS))
    }

    pub fn ether_to_usd(&self, ether: &BigDecimal, rate: &ExchangeRate) -> BigDecimal {
        self.usd(&(ether * rate.as_decimal()))
    }

    pub fn usd_to_ether(&self, usd: &BigDecimal, rate: &ExchangeRate) -> BigDecimal {
        self.ether(&(usd / rate.as_decimal()))
    }

    /// Fiat value of a per-gas amount given in ether. These are far below one cent, so they
    /// keep the ether precision instead of the fiat one.
    pub fn ether_to_usd_per_gas(&self, ether: &BigDecimal, rate: &ExchangeRate) -> BigDecimal {
        self.ether(&(ether * rate.as_decimal()))
    }
}

/// Divides by `10^places` without touching the digits.
fn shift_right(value: &BigDecimal, places: i64) -> BigDecimal {
    let (digits, scale) = value.as_bigint_and_exponent();
    BigDecimal::new(digits, scale.saturating_add(places))
}

pub fn u256_to_decimal(value: U256) -> BigDecimal {
    let mut bytes = [0_u8; 32];
    value.to_big_endian(&mut bytes);
    BigDecimal::new(BigInt::from_bytes_be(Sign::Plus, &bytes), 0)
}

/// Whole part of `value` as a `U256`, or `None` when it is negative or too large.
pub fn decimal_to_u256(value: &BigDecimal) -> Option<U256> {
    let (digits, _) = value
        .with_scale_round(0, RoundingMode::Down)
        .into_bigint_and_exponent();
    let (sign, bytes) = digits.to_bytes_be();
    if sign == Sign::Minus || bytes.len() > 32 {
        return None;
    }
    Some(U256::from_big_endian(&bytes))
}

/// Whether `value` lies below `10^MAX_DECIMAL_EXPONENT` and needs no more than
/// `MAX_DECIMAL_EXPONENT` fractional digits. Values outside that range would make every
/// later rescale allocate an integer with as many digits as the exponent.
pub fn is_within_exponent_range(value: &BigDecimal) -> bool {
    let normalized = value.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    // Bound the scale first so the comparison below never rescales a huge exponent.
    if !(-MAX_DECIMAL_EXPONENT..=MAX_DECIMAL_EXPONENT).contains(&scale) {
        return false;
    }
    normalized.abs() < BigDecimal::new(BigInt::from(1), -MAX_DECIMAL_EXPONENT)
}

/// Renders a decimal without exponent notation or trailing zeros.
pub fn plain(value: &BigDecimal) -> String {
    value.normalized().to_plain_string()
}
