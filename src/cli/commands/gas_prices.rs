use crate::cli::FeeSentinelConfig;
use clap::Args;
use fee_sentinel::units::plain;

#[derive(Args)]
pub(crate) struct GasPrices {
    /// Print the prices as JSON.
    #[clap(long)]
    pub json: bool,
}

pub(crate) async fn run(args: GasPrices, config: FeeSentinelConfig) -> anyhow::Result<()> {
    let estimator = config.fee_estimator()?;
    let prices = estimator.gas_prices().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prices)?);
        return Ok(());
    }
    let snapshot = &prices.snapshot;
    println!("Block {}", snapshot.block_number);
    println!("- ethToUsd: {}", prices.eth_to_usd);
    println!(
        "- baseFeePerGas: {} gwei ({} USD)",
        plain(&snapshot.base_fee_per_gas_gwei),
        plain(&prices.base_fee_per_gas_usd)
    );
    println!(
        "- gasPrice: {} gwei ({} USD)",
        plain(&snapshot.gas_price_gwei),
        plain(&prices.gas_price_usd)
    );
    println!(
        "- averagePriorityFeePerGas: {} gwei ({} USD)",
        plain(&snapshot.average_priority_fee_per_gas_gwei),
        plain(&prices.average_priority_fee_per_gas_usd)
    );
    Ok(())
}
