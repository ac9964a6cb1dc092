use crate::{
    gas_oracle::FiatGasPrices,
    units::{decimal_to_u256, ExchangeRate, UnitConverter},
};
use bigdecimal::BigDecimal;
use ethers::types::U256;
use serde::Serialize;
use std::fmt;

/// One fee expressed in wei, gwei, ether and USD.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeAmount {
    pub wei: BigDecimal,
    pub gwei: BigDecimal,
    pub eth: BigDecimal,
    pub usd: BigDecimal,
}

impl FeeAmount {
    pub fn from_wei(wei: BigDecimal, rate: &ExchangeRate, converter: &UnitConverter) -> Self {
        let gwei = converter.wei_to_gwei(&wei);
        let eth = converter.wei_to_ether(&wei);
        let usd = converter.ether_to_usd(&eth, rate);
        Self {
            wei,
            gwei,
            eth,
            usd,
        }
    }
}

/// The limit checks, in the order they are evaluated.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeLimitKey {
    #[serde(rename = "baseFeePerGasWei")]
    BaseFeePerGas,
    #[serde(rename = "baseFeeUsd")]
    BaseFeeUsd,
    #[serde(rename = "maxFeeUsd")]
    MaxFeeUsd,
}

impl FeeLimitKey {
    pub const ALL: [FeeLimitKey; 3] = [
        FeeLimitKey::BaseFeePerGas,
        FeeLimitKey::BaseFeeUsd,
        FeeLimitKey::MaxFeeUsd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeeLimitKey::BaseFeePerGas => "baseFeePerGasWei",
            FeeLimitKey::BaseFeeUsd => "baseFeeUsd",
            FeeLimitKey::MaxFeeUsd => "maxFeeUsd",
        }
    }
}

impl fmt::Display for FeeLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeLimitCheck {
    pub exceeded: bool,
    #[serde(rename = "msg")]
    pub message: String,
}

impl FeeLimitCheck {
    pub(crate) fn fired(message: String) -> Self {
        Self {
            exceeded: true,
            message,
        }
    }
}

/// Outcome of every limit check made during one estimation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeLimitReport {
    #[serde(rename = "baseFeePerGasWei")]
    pub base_fee_per_gas: FeeLimitCheck,
    pub base_fee_usd: FeeLimitCheck,
    pub max_fee_usd: FeeLimitCheck,
    /// Part of the priority fee that the fiat limit leaves no room for. Only set when the max
    /// fee exceeds the fiat limit while the base fee alone does not.
    pub unusable_priority_fee: Option<FeeAmount>,
    #[serde(rename = "limitExceededKeys")]
    pub exceeded_keys: Vec<FeeLimitKey>,
    #[serde(rename = "anyLimitExceeded")]
    pub any_exceeded: bool,
}

impl FeeLimitReport {
    pub(crate) fn new(
        base_fee_per_gas: FeeLimitCheck,
        base_fee_usd: FeeLimitCheck,
        max_fee_usd: FeeLimitCheck,
        unusable_priority_fee: Option<FeeAmount>,
    ) -> Self {
        let mut report = Self {
            base_fee_per_gas,
            base_fee_usd,
            max_fee_usd,
            unusable_priority_fee,
            exceeded_keys: Vec::new(),
            any_exceeded: false,
        };
        let exceeded_keys: Vec<FeeLimitKey> = FeeLimitKey::ALL
            .into_iter()
            .filter(|key| report.check(*key).exceeded)
            .collect();
        report.any_exceeded = !exceeded_keys.is_empty();
        report.exceeded_keys = exceeded_keys;
        report
    }

    pub fn check(&self, key: FeeLimitKey) -> &FeeLimitCheck {
        match key {
            FeeLimitKey::BaseFeePerGas => &self.base_fee_per_gas,
            FeeLimitKey::BaseFeeUsd => &self.base_fee_usd,
            FeeLimitKey::MaxFeeUsd => &self.max_fee_usd,
        }
    }

    /// The checks that fired, in evaluation order.
    pub fn exceeded(&self) -> impl Iterator<Item = (FeeLimitKey, &FeeLimitCheck)> + '_ {
        self.exceeded_keys.iter().map(|key| (*key, self.check(*key)))
    }
}

/// Why the priority fee per gas was lowered to the configured limit.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClampCause {
    /// The network's average priority fee alone is already above the limit.
    NetworkConditions,
    /// The average is acceptable; the multiplier pushed it over the limit.
    Multiplier,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityFeeClamp {
    pub requested_per_gas_wei: BigDecimal,
    pub limit_per_gas_wei: BigDecimal,
    pub average_per_gas_wei: BigDecimal,
    pub cause: ClampCause,
    #[serde(rename = "msg")]
    pub message: String,
}

/// Fee recommendation for one transaction.
///
/// `fee` is what the transaction is expected to cost: `max_fee` when it fits the fiat limit,
/// otherwise the fiat limit itself converted back to wei.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub estimated_gas: U256,
    pub gas_limit: U256,
    /// Largest fee per gas that keeps `estimated_gas` inside the fiat limit.
    pub max_fee_per_gas_wei: BigDecimal,
    /// Priority fee per gas after the configured limit was applied.
    pub max_priority_fee_per_gas_wei: BigDecimal,
    pub fee_limit: FeeAmount,
    pub base_fee: FeeAmount,
    pub max_priority_fee: FeeAmount,
    pub max_fee: FeeAmount,
    pub fee: FeeAmount,
    pub priority_fee_clamp: Option<PriorityFeeClamp>,
    #[serde(rename = "feeLimitChecks")]
    pub fee_limit_report: FeeLimitReport,
    pub gas_prices: FiatGasPrices,
}

impl FeeEstimate {
    /// `max_fee_per_gas_wei` as a transaction field, `None` if it is negative.
    pub fn max_fee_per_gas(&self) -> Option<U256> {
        decimal_to_u256(&self.max_fee_per_gas_wei)
    }

    /// `max_priority_fee_per_gas_wei` as a transaction field, `None` if it is negative.
    pub fn max_priority_fee_per_gas(&self) -> Option<U256> {
        decimal_to_u256(&self.max_priority_fee_per_gas_wei)
    }

    pub fn any_limit_exceeded(&self) -> bool {
        self.fee_limit_report.any_exceeded
    }
}
