use crate::{
    config::{FeeLimits, FeeLimitsConfig},
    errors::PriceFeedError,
    gas_oracle::{GasEstimator, GasPriceOracle, NetworkGasPrices},
    price_feed::FiatPriceOracle,
    units::ExchangeRate,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use ethers::{
    providers::ProviderError,
    types::{transaction::eip2718::TypedTransaction, U256, U64},
};
use std::{str::FromStr, time::Duration};

pub(crate) const GWEI: u64 = 1_000_000_000;

pub(crate) fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub(crate) fn limits(
    fee_limit_usd: &str,
    fee_per_gas_gwei: &str,
    priority_gwei: &str,
) -> FeeLimits {
    FeeLimits::try_from(FeeLimitsConfig {
        fee_limit_usd: Some(fee_limit_usd.to_owned()),
        fee_per_gas_limit_gwei: Some(fee_per_gas_gwei.to_owned()),
        priority_fee_per_gas_limit_gwei: Some(priority_gwei.to_owned()),
        ..FeeLimitsConfig::default()
    })
    .unwrap()
}

/// Node that always answers with the same gas estimate and fee market.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StaticChain {
    pub estimated_gas: U256,
    pub prices: NetworkGasPrices,
}

impl StaticChain {
    pub(crate) fn new(estimated_gas: u64, base_fee_gwei: u64, gas_price_gwei: u64) -> Self {
        Self {
            estimated_gas: U256::from(estimated_gas),
            prices: NetworkGasPrices {
                block_number: U64::from(1_000),
                base_fee_per_gas: U256::from(base_fee_gwei * GWEI),
                gas_price: U256::from(gas_price_gwei * GWEI),
            },
        }
    }
}

#[async_trait]
impl GasEstimator for StaticChain {
    async fn estimate_transaction_gas(
        &self,
        _transaction: &TypedTransaction,
    ) -> Result<U256, ProviderError> {
        Ok(self.estimated_gas)
    }
}

#[async_trait]
impl GasPriceOracle for StaticChain {
    async fn network_gas_prices(&self) -> Result<NetworkGasPrices, ProviderError> {
        Ok(self.prices)
    }
}

/// Node that rejects every request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UnreachableChain;

#[async_trait]
impl GasPriceOracle for UnreachableChain {
    async fn network_gas_prices(&self) -> Result<NetworkGasPrices, ProviderError> {
        Err(ProviderError::CustomError("connection refused".to_owned()))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StaticFeed(pub &'static str);

#[async_trait]
impl FiatPriceOracle for StaticFeed {
    async fn fetch_rate(&self) -> Result<ExchangeRate, PriceFeedError> {
        ExchangeRate::new(dec(self.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BrokenFeed;

#[async_trait]
impl FiatPriceOracle for BrokenFeed {
    async fn fetch_rate(&self) -> Result<ExchangeRate, PriceFeedError> {
        Err(PriceFeedError::MissingPrice("price".to_owned()))
    }
}

/// Answers like the wrapped chain once `delay` has passed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlowChain {
    pub chain: StaticChain,
    pub delay: Duration,
}

#[async_trait]
impl GasPriceOracle for SlowChain {
    async fn network_gas_prices(&self) -> Result<NetworkGasPrices, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.chain.network_gas_prices().await
    }
}

/// Answers like the wrapped feed once `delay` has passed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlowFeed {
    pub feed: StaticFeed,
    pub delay: Duration,
}

#[async_trait]
impl FiatPriceOracle for SlowFeed {
    async fn fetch_rate(&self) -> Result<ExchangeRate, PriceFeedError> {
        tokio::time::sleep(self.delay).await;
        self.feed.fetch_rate().await
    }
}
