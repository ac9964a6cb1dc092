use crate::cli::FeeSentinelConfig;
use clap::Args;
use fee_sentinel::{
    types::{Address, Bytes, Eip1559TransactionRequest, U256},
    units::plain,
};

#[derive(Args)]
pub(crate) struct Estimate {
    #[clap(long, value_name = "FROM_ADDRESS")]
    pub from: Address,
    /// Leave out to estimate a contract deployment.
    #[clap(long, value_name = "TO_ADDRESS")]
    pub to: Option<Address>,
    #[clap(long, value_name = "CALLDATA")]
    pub data: Option<Bytes>,
    /// Value in wei.
    #[clap(long, value_parser = parse_wei)]
    pub value: Option<U256>,
    /// Print the whole estimate as JSON.
    #[clap(long)]
    pub json: bool,
}

fn parse_wei(value: &str) -> Result<U256, String> {
    U256::from_dec_str(value).map_err(|err| format!("invalid wei amount {value:?}: {err}"))
}

pub(crate) async fn run(args: Estimate, config: FeeSentinelConfig) -> anyhow::Result<bool> {
    let estimator = config.fee_estimator()?;

    let mut request = Eip1559TransactionRequest::new().from(args.from);
    if let Some(to) = args.to {
        request = request.to(to);
    }
    if let Some(data) = args.data {
        request = request.data(data);
    }
    if let Some(value) = args.value {
        request = request.value(value);
    }

    let estimate = estimator.estimate(&request.into()).await?;
    log::debug!("{estimate:#?}");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else if estimate.any_limit_exceeded() {
        for (key, check) in estimate.fee_limit_report.exceeded() {
            eprintln!("- {key}: {}", check.message);
        }
    } else {
        println!(
            "Estimated fee: {} ETH ({} USD)",
            plain(&estimate.fee.eth),
            plain(&estimate.fee.usd)
        );
        println!("- gasLimit: {}", estimate.gas_limit);
        println!(
            "- maxFeePerGasWei: {}",
            plain(&estimate.max_fee_per_gas_wei)
        );
        println!(
            "- maxPriorityFeePerGasWei: {}",
            plain(&estimate.max_priority_fee_per_gas_wei)
        );
    }
    Ok(!estimate.any_limit_exceeded())
}
