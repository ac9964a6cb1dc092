use crate::units::{u256_to_decimal, ExchangeRate, UnitConverter};
use bigdecimal::BigDecimal;
use ethers::types::{U256, U64};
use serde::{Deserialize, Serialize};

/// Fee data read from the node, in wei.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGasPrices {
    pub block_number: U64,
    pub base_fee_per_gas: U256,
    pub gas_price: U256,
}

/// Fee data of one block, with every per-gas value in wei, gwei and ether.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GasSnapshot {
    pub block_number: U64,
    pub base_fee_per_gas_wei: BigDecimal,
    pub gas_price_wei: BigDecimal,
    /// `gas_price_wei - base_fee_per_gas_wei`. Zero or negative when the node quotes a gas
    /// price at or below the base fee.
    pub average_priority_fee_per_gas_wei: BigDecimal,
    pub base_fee_per_gas_gwei: BigDecimal,
    pub base_fee_per_gas_eth: BigDecimal,
    pub gas_price_gwei: BigDecimal,
    pub gas_price_eth: BigDecimal,
    pub average_priority_fee_per_gas_gwei: BigDecimal,
    pub average_priority_fee_per_gas_eth: BigDecimal,
}

impl GasSnapshot {
    pub fn derive(prices: NetworkGasPrices, converter: &UnitConverter) -> Self {
        let base_fee_per_gas_wei = u256_to_decimal(prices.base_fee_per_gas);
        let gas_price_wei = u256_to_decimal(prices.gas_price);
        let average_priority_fee_per_gas_wei = &gas_price_wei - &base_fee_per_gas_wei;

        Self {
            block_number: prices.block_number,
            base_fee_per_gas_gwei: converter.wei_to_gwei(&base_fee_per_gas_wei),
            base_fee_per_gas_eth: converter.wei_to_ether(&base_fee_per_gas_wei),
            gas_price_gwei: converter.wei_to_gwei(&gas_price_wei),
            gas_price_eth: converter.wei_to_ether(&gas_price_wei),
            average_priority_fee_per_gas_gwei: converter
                .wei_to_gwei(&average_priority_fee_per_gas_wei),
            average_priority_fee_per_gas_eth: converter
                .wei_to_ether(&average_priority_fee_per_gas_wei),
            base_fee_per_gas_wei,
            gas_price_wei,
            average_priority_fee_per_gas_wei,
        }
    }
}

/// A [`GasSnapshot`] together with the exchange rate and per-gas fiat values.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FiatGasPrices {
    #[serde(flatten)]
    pub snapshot: GasSnapshot,
    pub eth_to_usd: ExchangeRate,
    pub base_fee_per_gas_usd: BigDecimal,
    pub gas_price_usd: BigDecimal,
    pub average_priority_fee_per_gas_usd: BigDecimal,
}

impl FiatGasPrices {
    pub fn new(snapshot: GasSnapshot, eth_to_usd: ExchangeRate, converter: &UnitConverter) -> Self {
        Self {
            base_fee_per_gas_usd: converter
                .ether_to_usd_per_gas(&snapshot.base_fee_per_gas_eth, &eth_to_usd),
            gas_price_usd: converter.ether_to_usd_per_gas(&snapshot.gas_price_eth, &eth_to_usd),
            average_priority_fee_per_gas_usd: converter
                .ether_to_usd_per_gas(&snapshot.average_priority_fee_per_gas_eth, &eth_to_usd),
            snapshot,
            eth_to_usd,
        }
    }
}
