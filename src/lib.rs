#![warn(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]
#![recursion_limit = "256"]
#![warn(
    clippy::allow_attributes_without_reason,
    clippy::as_conversions,
    clippy::as_ptr_cast_mut,
    clippy::unnecessary_cast,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::empty_structs_with_brackets,
    clippy::float_cmp_const,
    clippy::fn_to_numeric_cast_any,
    clippy::indexing_slicing,
    clippy::iter_kv_map,
    clippy::manual_clamp,
    clippy::manual_filter,
    clippy::map_err_ignore,
    clippy::uninlined_format_args,
    clippy::unseparated_literal_suffix,
    clippy::unused_format_specs,
    clippy::single_char_lifetime_names,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_slice,
    clippy::string_to_string,
    clippy::todo,
    clippy::try_err
)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(
    clippy::module_inception,
    clippy::module_name_repetitions,
    clippy::let_underscore_must_use
)]

//! Transaction fee estimation under per-gas, per-block and fiat spending limits.
//!
//! [`FeeEstimator`] asks an Ethereum node for a gas estimate and the current fee market,
//! asks a price feed for the ether to USD rate, and derives a fee recommendation that never
//! exceeds the configured fiat ceiling.

pub use ethers::{providers, types};

pub mod config;
pub mod errors;
pub mod estimator;
pub mod gas_oracle;
pub mod price_feed;
pub mod units;

#[cfg(test)]
mod test_utils;

pub use config::{FeeLimits, FeeLimitsConfig, OraclePolicy};
pub use errors::{ConfigError, EstimationError, PriceFeedError};
pub use estimator::{
    derive_fee_estimate, estimate_fees, gas_prices_with_fiat, FeeAmount, FeeEstimate,
    FeeEstimator, FeeLimitKey, FeeLimitReport,
};
pub use gas_oracle::{FiatGasPrices, GasEstimator, GasPriceOracle, GasSnapshot};
pub use price_feed::{FiatPriceOracle, HttpPriceFeed};
pub use units::{ExchangeRate, Precision, RoundingPolicy, UnitConverter};
