use bigdecimal::BigDecimal;
use ethers::providers::ProviderError;
use std::{fmt, time::Duration};

/// Every way a fee estimation can fail. Exceeding a configured limit is not one of them:
/// that outcome is reported through [`crate::estimator::FeeLimitReport`].
#[derive(thiserror::Error, Debug)]
pub enum EstimationError {
    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),
    #[error("Price feed error: {0}")]
    PriceFeedError(#[from] PriceFeedError),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Gas estimation returned zero gas for the transaction")]
    ZeroGasEstimate,
    #[error("Gas limit {0} does not fit in 256 bits")]
    GasLimitOverflow(BigDecimal),
    #[error("{call} did not complete within {after:?}")]
    Timeout { call: OracleCall, after: Duration },
}

#[derive(thiserror::Error, Debug)]
pub enum PriceFeedError {
    #[error("Request to price feed failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Http error while fetching price. Status: {status}, msg: {body}")]
    StatusError {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed price feed response: {0}")]
    DecodeError(#[from] serde_json::Error),
    #[error("Price not found in field `{0}`")]
    MissingPrice(String),
    #[error("Price `{value}` is not a decimal number: {reason}")]
    InvalidPrice { value: String, reason: String },
    #[error("Exchange rate must be positive, got {0}")]
    NonPositiveRate(BigDecimal),
    #[error("Exchange rate with scale {scale} is outside the supported range")]
    RateOutOfRange { scale: i64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing config value `{0}`")]
    MissingValue(&'static str),
    #[error("Config value `{field}` = \"{value}\" is not a decimal number: {reason}")]
    InvalidDecimal {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("Config value `{field}` = {value} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("Unknown rounding policy \"{0}\"")]
    UnknownRounding(String),
}

/// The network round-trips an estimation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleCall {
    GasEstimate,
    GasPrices,
    FiatRate,
}

impl fmt::Display for OracleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OracleCall::GasEstimate => "gas estimation",
            OracleCall::GasPrices => "gas price query",
            OracleCall::FiatRate => "fiat price query",
        };
        f.write_str(name)
    }
}
