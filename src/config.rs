use crate::{
    errors::ConfigError,
    units::{is_within_exponent_range, plain, Precision, UnitConverter, MAX_DECIMAL_EXPONENT},
};
use bigdecimal::{BigDecimal, One, Zero};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

pub const DEFAULT_GAS_LIMIT_MULTIPLIER: &str = "1.2";
pub const DEFAULT_AVERAGE_PRIORITY_FEE_MULTIPLIER: &str = "2";

pub const FEE_LIMIT_USD_ENV: &str = "MAX_FEE_PER_TRANSACTION_USD";
pub const FEE_PER_GAS_LIMIT_GWEI_ENV: &str = "MAX_FEE_PER_GAS_GWEI";
pub const PRIORITY_FEE_PER_GAS_LIMIT_GWEI_ENV: &str = "MAX_PRIORITY_FEE_PER_GAS_GWEI";
pub const GAS_LIMIT_MULTIPLIER_ENV: &str = "GAS_LIMIT_MULTIPLIER";
pub const AVERAGE_PRIORITY_FEE_MULTIPLIER_ENV: &str = "AVERAGE_PRIORITY_FEE_MULTIPLIER";

/// Timeout and retry policy for the network calls made during an estimation.
///
/// The default never times out and never retries: a failing call fails the estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OraclePolicy {
    pub timeout_ms: Option<u64>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl OraclePolicy {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Fee limits exactly as they are written in the environment or a config file.
///
/// Numbers stay text until [`FeeLimits::try_from`] parses them straight into decimals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeLimitsConfig {
    pub fee_limit_usd: Option<String>,
    pub fee_per_gas_limit_gwei: Option<String>,
    pub priority_fee_per_gas_limit_gwei: Option<String>,
    pub gas_limit_multiplier: Option<String>,
    pub average_priority_fee_multiplier: Option<String>,
    pub precision: Precision,
    pub oracle_policy: OraclePolicy,
}

impl FeeLimitsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key-value source that uses the environment variable names.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            fee_limit_usd: lookup(FEE_LIMIT_USD_ENV),
            fee_per_gas_limit_gwei: lookup(FEE_PER_GAS_LIMIT_GWEI_ENV),
            priority_fee_per_gas_limit_gwei: lookup(PRIORITY_FEE_PER_GAS_LIMIT_GWEI_ENV),
            gas_limit_multiplier: lookup(GAS_LIMIT_MULTIPLIER_ENV),
            average_priority_fee_multiplier: lookup(AVERAGE_PRIORITY_FEE_MULTIPLIER_ENV),
            ..Self::default()
        }
    }
}

/// Validated spending ceilings and estimation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeLimits {
    fee_limit_usd: BigDecimal,
    fee_per_gas_limit_wei: BigDecimal,
    fee_per_gas_limit_gwei: BigDecimal,
    priority_fee_per_gas_limit_wei: BigDecimal,
    gas_limit_multiplier: BigDecimal,
    average_priority_fee_multiplier: BigDecimal,
    converter: UnitConverter,
    oracle_policy: OraclePolicy,
}

impl FeeLimits {
    pub fn fee_limit_usd(&self) -> &BigDecimal {
        &self.fee_limit_usd
    }

    pub fn fee_per_gas_limit_wei(&self) -> &BigDecimal {
        &self.fee_per_gas_limit_wei
    }

    pub fn fee_per_gas_limit_gwei(&self) -> &BigDecimal {
        &self.fee_per_gas_limit_gwei
    }

    pub fn priority_fee_per_gas_limit_wei(&self) -> &BigDecimal {
        &self.priority_fee_per_gas_limit_wei
    }

    pub fn gas_limit_multiplier(&self) -> &BigDecimal {
        &self.gas_limit_multiplier
    }

    pub fn average_priority_fee_multiplier(&self) -> &BigDecimal {
        &self.average_priority_fee_multiplier
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    pub fn oracle_policy(&self) -> &OraclePolicy {
        &self.oracle_policy
    }
}

impl TryFrom<FeeLimitsConfig> for FeeLimits {
    type Error = ConfigError;

    fn try_from(config: FeeLimitsConfig) -> Result<Self, Self::Error> {
        check_precision(&config.precision)?;
        let converter = UnitConverter::new(config.precision);

        let fee_limit_usd = parse_decimal("fee_limit_usd", config.fee_limit_usd.as_deref())?;
        ensure_at_least(
            "fee_limit_usd",
            &fee_limit_usd,
            &BigDecimal::zero(),
            "must not be negative",
        )?;

        let fee_per_gas_limit_gwei = parse_decimal(
            "fee_per_gas_limit_gwei",
            config.fee_per_gas_limit_gwei.as_deref(),
        )?;
        ensure_at_least(
            "fee_per_gas_limit_gwei",
            &fee_per_gas_limit_gwei,
            &BigDecimal::zero(),
            "must not be negative",
        )?;

        let priority_fee_per_gas_limit_gwei = parse_decimal(
            "priority_fee_per_gas_limit_gwei",
            config.priority_fee_per_gas_limit_gwei.as_deref(),
        )?;
        ensure_at_least(
            "priority_fee_per_gas_limit_gwei",
            &priority_fee_per_gas_limit_gwei,
            &BigDecimal::zero(),
            "must not be negative",
        )?;

        let gas_limit_multiplier = parse_decimal(
            "gas_limit_multiplier",
            Some(
                config
                    .gas_limit_multiplier
                    .as_deref()
                    .unwrap_or(DEFAULT_GAS_LIMIT_MULTIPLIER),
            ),
        )?;
        ensure_at_least(
            "gas_limit_multiplier",
            &gas_limit_multiplier,
            &BigDecimal::one(),
            "must be at least 1",
        )?;

        let average_priority_fee_multiplier = parse_decimal(
            "average_priority_fee_multiplier",
            Some(
                config
                    .average_priority_fee_multiplier
                    .as_deref()
                    .unwrap_or(DEFAULT_AVERAGE_PRIORITY_FEE_MULTIPLIER),
            ),
        )?;
        ensure_at_least(
            "average_priority_fee_multiplier",
            &average_priority_fee_multiplier,
            &BigDecimal::zero(),
            "must not be negative",
        )?;

        Ok(Self {
            fee_limit_usd,
            fee_per_gas_limit_wei: converter.gwei_to_wei(&fee_per_gas_limit_gwei),
            fee_per_gas_limit_gwei,
            priority_fee_per_gas_limit_wei: converter
                .gwei_to_wei(&priority_fee_per_gas_limit_gwei),
            gas_limit_multiplier,
            average_priority_fee_multiplier,
            converter,
            oracle_policy: config.oracle_policy,
        })
    }
}

fn parse_decimal(field: &'static str, value: Option<&str>) -> Result<BigDecimal, ConfigError> {
    let text = value.ok_or(ConfigError::MissingValue(field))?.trim();
    if text.is_empty() {
        return Err(ConfigError::MissingValue(field));
    }
    let value = BigDecimal::from_str(text).map_err(|err| ConfigError::InvalidDecimal {
        field,
        value: text.to_owned(),
        reason: err.to_string(),
    })?;
    if !is_within_exponent_range(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value: text.to_owned(),
            reason: "exponent is outside the supported range",
        });
    }
    Ok(value)
}

/// Decimal places must be in `0..=MAX_DECIMAL_EXPONENT`. Negative places would round every
/// fiat amount to zero and silently disable the fiat checks.
fn check_precision(precision: &Precision) -> Result<(), ConfigError> {
    let places = [
        ("precision.wei", precision.wei),
        ("precision.gwei", precision.gwei),
        ("precision.ether", precision.ether),
        ("precision.usd", precision.usd),
    ];
    for (field, value) in places {
        if !(0..=MAX_DECIMAL_EXPONENT).contains(&value) {
            return Err(ConfigError::OutOfRange {
                field,
                value: value.to_string(),
                reason: "decimal places must be between 0 and 78",
            });
        }
    }
    Ok(())
}

fn ensure_at_least(
    field: &'static str,
    value: &BigDecimal,
    minimum: &BigDecimal,
    reason: &'static str,
) -> Result<(), ConfigError> {
    if value < minimum {
        return Err(ConfigError::OutOfRange {
            field,
            value: plain(value),
            reason,
        });
    }
    Ok(())
}
