pub(crate) mod commands;
use clap::{Args, Parser, Subcommand};
use commands::{estimate, gas_prices, Estimate, GasPrices};
use fee_sentinel::{
    config::{
        AVERAGE_PRIORITY_FEE_MULTIPLIER_ENV, FEE_LIMIT_USD_ENV, FEE_PER_GAS_LIMIT_GWEI_ENV,
        GAS_LIMIT_MULTIPLIER_ENV, PRIORITY_FEE_PER_GAS_LIMIT_GWEI_ENV,
    },
    price_feed::DEFAULT_PRICE_FIELD,
    providers::{Http, Provider},
    FeeEstimator, FeeLimits, FeeLimitsConfig, HttpPriceFeed, OraclePolicy,
};
use url::Url;

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name="fee-sentinel", author, version=VERSION_STRING, about, long_about = None)]
pub(crate) struct FeeSentinel {
    #[command(subcommand)]
    command: FeeSentinelCommand,
    #[clap(flatten)]
    pub config: FeeSentinelConfig,
}

#[derive(Args)]
pub(crate) struct FeeSentinelConfig {
    #[clap(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    pub rpc_url: Url,
    /// JSON endpoint returning the price of one ether in USD.
    #[clap(long, env = "ETH_USD_PRICE_URL")]
    pub price_feed_url: Url,
    #[clap(long, env = "ETH_USD_PRICE_FIELD", default_value = DEFAULT_PRICE_FIELD)]
    pub price_field: String,
    #[clap(long, env = FEE_LIMIT_USD_ENV)]
    pub fee_limit_usd: String,
    #[clap(long, env = FEE_PER_GAS_LIMIT_GWEI_ENV)]
    pub fee_per_gas_limit_gwei: String,
    #[clap(long, env = PRIORITY_FEE_PER_GAS_LIMIT_GWEI_ENV)]
    pub priority_fee_per_gas_limit_gwei: String,
    #[clap(long, env = GAS_LIMIT_MULTIPLIER_ENV)]
    pub gas_limit_multiplier: Option<String>,
    #[clap(long, env = AVERAGE_PRIORITY_FEE_MULTIPLIER_ENV)]
    pub average_priority_fee_multiplier: Option<String>,
    #[clap(long, env = "ORACLE_TIMEOUT_MS")]
    pub oracle_timeout_ms: Option<u64>,
    #[clap(long, env = "ORACLE_RETRIES", default_value = "0")]
    pub oracle_retries: u32,
    #[clap(long, env = "ORACLE_RETRY_DELAY_MS", default_value = "500")]
    pub oracle_retry_delay_ms: u64,
    #[clap(long, env = "LOG_LEVEL", default_value = "error")]
    pub log_level: log::LevelFilter,
    /// Shorthand for `--log-level debug`.
    #[clap(long)]
    pub debug: bool,
}

impl FeeSentinelConfig {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            self.log_level
        }
    }

    fn fee_limits(&self) -> anyhow::Result<FeeLimits> {
        let config = FeeLimitsConfig {
            fee_limit_usd: Some(self.fee_limit_usd.clone()),
            fee_per_gas_limit_gwei: Some(self.fee_per_gas_limit_gwei.clone()),
            priority_fee_per_gas_limit_gwei: Some(self.priority_fee_per_gas_limit_gwei.clone()),
            gas_limit_multiplier: self.gas_limit_multiplier.clone(),
            average_priority_fee_multiplier: self.average_priority_fee_multiplier.clone(),
            oracle_policy: OraclePolicy {
                timeout_ms: self.oracle_timeout_ms,
                max_retries: self.oracle_retries,
                retry_delay_ms: self.oracle_retry_delay_ms,
            },
            ..FeeLimitsConfig::default()
        };
        Ok(FeeLimits::try_from(config)?)
    }

    /// Validates the limits and connects the estimator. Nothing is sent over the network yet.
    pub(crate) fn fee_estimator(
        &self,
    ) -> anyhow::Result<FeeEstimator<Provider<Http>, HttpPriceFeed>> {
        let limits = self.fee_limits()?;
        let provider = Provider::<Http>::try_from(self.rpc_url.as_str())?
            .interval(std::time::Duration::from_millis(10));
        let price_feed = HttpPriceFeed::new(self.price_feed_url.clone(), reqwest::Client::new())
            .with_price_field(self.price_field.clone());
        Ok(FeeEstimator::new(limits, provider, price_feed))
    }
}

#[derive(Subcommand)]
enum FeeSentinelCommand {
    Estimate(Estimate),
    GasPrices(GasPrices),
}

/// Runs the parsed command. Returns `false` when the estimate exceeded a limit.
pub(crate) async fn start(args: FeeSentinel) -> anyhow::Result<bool> {
    let FeeSentinel { command, config } = args;
    let within_limits = match command {
        FeeSentinelCommand::Estimate(args) => estimate::run(args, config).await?,
        FeeSentinelCommand::GasPrices(args) => {
            gas_prices::run(args, config).await?;
            true
        }
    };

    Ok(within_limits)
}
