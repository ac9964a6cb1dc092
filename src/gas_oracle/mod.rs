use crate::units::{plain, UnitConverter};
use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcClient, Middleware, Provider, ProviderError},
    types::{transaction::eip2718::TypedTransaction, BlockNumber, U256},
};

pub mod types;
pub use types::{FiatGasPrices, GasSnapshot, NetworkGasPrices};

/// Asks the node how much gas a transaction needs.
#[async_trait]
pub trait GasEstimator: Send + Sync {
    /// Returns the gas the node expects `transaction` to consume (`eth_estimateGas`).
    async fn estimate_transaction_gas(
        &self,
        transaction: &TypedTransaction,
    ) -> Result<U256, ProviderError>;
}

/// Reads the current fee market from the node.
#[async_trait]
pub trait GasPriceOracle: Send + Sync {
    /// Returns the latest block's base fee per gas and the node's current gas price.
    async fn network_gas_prices(&self) -> Result<NetworkGasPrices, ProviderError>;
}

#[async_trait]
impl<P: JsonRpcClient> GasEstimator for Provider<P> {
    async fn estimate_transaction_gas(
        &self,
        transaction: &TypedTransaction,
    ) -> Result<U256, ProviderError> {
        Middleware::estimate_gas(self, transaction, None).await
    }
}

#[async_trait]
impl<P: JsonRpcClient> GasPriceOracle for Provider<P> {
    async fn network_gas_prices(&self) -> Result<NetworkGasPrices, ProviderError> {
        let block = self
            .get_block(BlockNumber::Latest)
            .await?
            .ok_or_else(|| ProviderError::CustomError("Latest block not available".to_owned()))?;
        let block_number = block.number.ok_or_else(|| {
            ProviderError::CustomError("Latest block has no block number".to_owned())
        })?;
        let base_fee_per_gas = block.base_fee_per_gas.ok_or_else(|| {
            ProviderError::CustomError(format!(
                "Block {block_number} has no base fee per gas (pre-London chain?)"
            ))
        })?;
        let gas_price = self.get_gas_price().await?;

        Ok(NetworkGasPrices {
            block_number,
            base_fee_per_gas,
            gas_price,
        })
    }
}

/// Fetches the current fee market and derives a [`GasSnapshot`] from it.
pub async fn fetch_gas_snapshot<O>(
    oracle: &O,
    converter: &UnitConverter,
) -> Result<GasSnapshot, ProviderError>
where
    O: GasPriceOracle + ?Sized,
{
    let prices = oracle.network_gas_prices().await?;
    let snapshot = GasSnapshot::derive(prices, converter);
    log::debug!(
        "block {}: baseFeePerGas {} wei, gasPrice {} wei, averagePriorityFeePerGas {} wei",
        snapshot.block_number,
        plain(&snapshot.base_fee_per_gas_wei),
        plain(&snapshot.gas_price_wei),
        plain(&snapshot.average_priority_fee_per_gas_wei)
    );
    Ok(snapshot)
}
