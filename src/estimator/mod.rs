use crate::{
    config::FeeLimits,
    errors::{EstimationError, OracleCall},
    gas_oracle::{fetch_gas_snapshot, FiatGasPrices, GasEstimator, GasPriceOracle},
    price_feed::FiatPriceOracle,
    units::{decimal_to_u256, plain, u256_to_decimal},
};
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use ethers::types::{transaction::eip2718::TypedTransaction, U256};

mod policy;
pub(crate) use policy::call_with_policy;

pub mod types;
pub use types::{
    ClampCause, FeeAmount, FeeEstimate, FeeLimitCheck, FeeLimitKey, FeeLimitReport,
    PriorityFeeClamp,
};

/// Estimates the fees of `transaction` and checks them against `limits`.
///
/// Gas estimation runs first; the gas price query and the fiat price query then run
/// concurrently. Any failed call fails the whole estimation with that call's error.
/// Exceeded limits do not: they are reported in [`FeeEstimate::fee_limit_report`].
pub async fn estimate_fees<E, G, F>(
    limits: &FeeLimits,
    gas_estimator: &E,
    gas_oracle: &G,
    fiat_oracle: &F,
    transaction: &TypedTransaction,
) -> Result<FeeEstimate, EstimationError>
where
    E: GasEstimator + ?Sized,
    G: GasPriceOracle + ?Sized,
    F: FiatPriceOracle + ?Sized,
{
    let estimated_gas = call_with_policy(limits.oracle_policy(), OracleCall::GasEstimate, || {
        gas_estimator.estimate_transaction_gas(transaction)
    })
    .await?;
    if estimated_gas.is_zero() {
        return Err(EstimationError::ZeroGasEstimate);
    }
    log::debug!("estimatedGas: {estimated_gas}");

    let gas_prices = gas_prices_with_fiat(limits, gas_oracle, fiat_oracle).await?;
    derive_fee_estimate(limits, estimated_gas, gas_prices)
}

/// Fetches the current fee market and the fiat exchange rate concurrently.
pub async fn gas_prices_with_fiat<G, F>(
    limits: &FeeLimits,
    gas_oracle: &G,
    fiat_oracle: &F,
) -> Result<FiatGasPrices, EstimationError>
where
    G: GasPriceOracle + ?Sized,
    F: FiatPriceOracle + ?Sized,
{
    let policy = limits.oracle_policy();
    let converter = limits.converter();
    let (snapshot, eth_to_usd) = tokio::try_join!(
        call_with_policy(policy, OracleCall::GasPrices, || {
            fetch_gas_snapshot(gas_oracle, converter)
        }),
        call_with_policy(policy, OracleCall::FiatRate, || fiat_oracle.fetch_rate()),
    )?;
    Ok(FiatGasPrices::new(snapshot, eth_to_usd, converter))
}

/// Derives the fee estimate from already fetched network data. Pure: the same inputs always
/// produce the same estimate.
pub fn derive_fee_estimate(
    limits: &FeeLimits,
    estimated_gas: U256,
    gas_prices: FiatGasPrices,
) -> Result<FeeEstimate, EstimationError> {
    if estimated_gas.is_zero() {
        return Err(EstimationError::ZeroGasEstimate);
    }
    let converter = limits.converter();
    let rate = gas_prices.eth_to_usd.clone();
    let snapshot = &gas_prices.snapshot;
    let fee_limit_usd = limits.fee_limit_usd();
    let gas = u256_to_decimal(estimated_gas);

    let gas_limit_decimal =
        (&gas * limits.gas_limit_multiplier()).with_scale_round(0, RoundingMode::Ceiling);
    let gas_limit = decimal_to_u256(&gas_limit_decimal)
        .ok_or_else(|| EstimationError::GasLimitOverflow(gas_limit_decimal.clone()))?;
    log::debug!("gasLimit: {gas_limit}");

    let base_fee_per_gas_check = if snapshot.base_fee_per_gas_wei > *limits.fee_per_gas_limit_wei()
    {
        FeeLimitCheck::fired(format!(
            "Current base fee per gas ({} gwei, {} wei) exceeds limit specified in config ({} gwei, {} wei).",
            plain(&snapshot.base_fee_per_gas_gwei),
            plain(&snapshot.base_fee_per_gas_wei),
            plain(limits.fee_per_gas_limit_gwei()),
            plain(limits.fee_per_gas_limit_wei()),
        ))
    } else {
        FeeLimitCheck::default()
    };

    let base_fee = FeeAmount::from_wei(
        converter.wei(&(&gas * &snapshot.base_fee_per_gas_wei)),
        &rate,
        converter,
    );
    log::debug!(
        "baseFee: {} wei, {} USD",
        plain(&base_fee.wei),
        plain(&base_fee.usd)
    );

    let base_fee_usd_check = if base_fee.usd > *fee_limit_usd {
        FeeLimitCheck::fired(format!(
            "Base fee ({} USD) exceeds limit specified in config ({} USD).",
            plain(&base_fee.usd),
            plain(fee_limit_usd),
        ))
    } else {
        FeeLimitCheck::default()
    };

    // The fiat limit in every unit, and the fee per gas that keeps the estimated gas inside it.
    let fee_limit_eth = converter.usd_to_ether(fee_limit_usd, &rate);
    let fee_limit_wei = converter.ether_to_wei(&fee_limit_eth);
    let fee_limit = FeeAmount {
        gwei: converter.wei_to_gwei(&fee_limit_wei),
        wei: fee_limit_wei,
        eth: fee_limit_eth,
        usd: fee_limit_usd.clone(),
    };
    let max_fee_per_gas_wei = converter.wei(&(&fee_limit.wei / &gas));
    log::debug!(
        "feeLimit: {} ETH, {} wei; maxFeePerGas: {} wei",
        plain(&fee_limit.eth),
        plain(&fee_limit.wei),
        plain(&max_fee_per_gas_wei)
    );

    let (max_priority_fee_per_gas_wei, priority_fee_clamp) =
        clamp_priority_fee(limits, &snapshot.average_priority_fee_per_gas_wei);
    log::debug!(
        "maxPriorityFeePerGas: {} wei",
        plain(&max_priority_fee_per_gas_wei)
    );

    let max_priority_fee = FeeAmount::from_wei(
        converter.wei(&(&gas * &max_priority_fee_per_gas_wei)),
        &rate,
        converter,
    );
    let max_fee = FeeAmount::from_wei(
        converter.wei(&(&base_fee.wei + &max_priority_fee.wei)),
        &rate,
        converter,
    );
    log::debug!(
        "maxFee: {} wei, {} USD",
        plain(&max_fee.wei),
        plain(&max_fee.usd)
    );

    let (max_fee_usd_check, unusable_priority_fee, fee) = if max_fee.usd > *fee_limit_usd {
        let mut message = format!(
            "Max fee ({} USD) exceeds limit specified in config ({} USD).",
            plain(&max_fee.usd),
            plain(fee_limit_usd),
        );
        // With the base fee already over the limit, the priority fee is not the only problem.
        let unusable = if base_fee_usd_check.exceeded {
            None
        } else {
            let usd = converter.usd(&(&max_fee.usd - fee_limit_usd));
            let eth = converter.usd_to_ether(&usd, &rate);
            let wei = converter.ether_to_wei(&eth);
            let unusable = FeeAmount {
                gwei: converter.wei_to_gwei(&wei),
                wei,
                eth,
                usd,
            };
            message.push_str(&format!(
                " The transaction won't be able to use its entire priority fee. Unusable amount = ({} gwei, {} USD), out of total available = ({} gwei, {} USD).",
                plain(&unusable.gwei),
                plain(&unusable.usd),
                plain(&max_priority_fee.gwei),
                plain(&max_priority_fee.usd),
            ));
            Some(unusable)
        };
        log::debug!("{message}");
        // Work back from the fiat limit so the final fee can never exceed it.
        (FeeLimitCheck::fired(message), unusable, fee_limit.clone())
    } else {
        (FeeLimitCheck::default(), None, max_fee.clone())
    };

    if fee.wei < BigDecimal::zero() {
        log::warn!(
            "Estimated fee is negative ({} wei): the node quotes a gas price below the base fee",
            plain(&fee.wei)
        );
    }

    let fee_limit_report = FeeLimitReport::new(
        base_fee_per_gas_check,
        base_fee_usd_check,
        max_fee_usd_check,
        unusable_priority_fee,
    );
    for (key, check) in fee_limit_report.exceeded() {
        log::warn!("{key} limit exceeded: {}", check.message);
    }

    Ok(FeeEstimate {
        estimated_gas,
        gas_limit,
        max_fee_per_gas_wei,
        max_priority_fee_per_gas_wei,
        fee_limit,
        base_fee,
        max_priority_fee,
        max_fee,
        fee,
        priority_fee_clamp,
        fee_limit_report,
        gas_prices,
    })
}

/// Multiplies the network's average priority fee and lowers the result to the configured
/// limit. Only an upper bound is enforced: zero and negative values pass through.
fn clamp_priority_fee(
    limits: &FeeLimits,
    average: &BigDecimal,
) -> (BigDecimal, Option<PriorityFeeClamp>) {
    let converter = limits.converter();
    let limit = limits.priority_fee_per_gas_limit_wei();
    let requested = converter.wei(&(average * limits.average_priority_fee_multiplier()));
    if requested <= *limit {
        return (requested, None);
    }

    let (cause, comparator) = if average > limit {
        (ClampCause::NetworkConditions, "greater")
    } else {
        (ClampCause::Multiplier, "less")
    };
    let message = format!(
        "Max priority fee per gas ({} wei) exceeds limit specified in config ({} wei). Using config limit instead. Note: averagePriorityFeePerGasWei = {} wei, which is {comparator} than config limit.",
        plain(&requested),
        plain(limit),
        plain(average),
    );
    log::debug!("{message}");

    let clamp = PriorityFeeClamp {
        requested_per_gas_wei: requested,
        limit_per_gas_wei: limit.clone(),
        average_per_gas_wei: average.clone(),
        cause,
        message,
    };
    (limit.clone(), Some(clamp))
}

/// Fee estimation bound to one node and one price feed.
#[derive(Debug, Clone)]
pub struct FeeEstimator<C, F> {
    limits: FeeLimits,
    chain: C,
    price_feed: F,
}

impl<C, F> FeeEstimator<C, F>
where
    C: GasEstimator + GasPriceOracle,
    F: FiatPriceOracle,
{
    pub fn new(limits: FeeLimits, chain: C, price_feed: F) -> Self {
        Self {
            limits,
            chain,
            price_feed,
        }
    }

    pub fn limits(&self) -> &FeeLimits {
        &self.limits
    }

    pub async fn estimate(
        &self,
        transaction: &TypedTransaction,
    ) -> Result<FeeEstimate, EstimationError> {
        estimate_fees(
            &self.limits,
            &self.chain,
            &self.chain,
            &self.price_feed,
            transaction,
        )
        .await
    }

    pub async fn gas_prices(&self) -> Result<FiatGasPrices, EstimationError> {
        gas_prices_with_fiat(&self.limits, &self.chain, &self.price_feed).await
    }
}
