use ethers::{
    providers::{MockProvider, Provider},
    types::{Block, TxHash, U256, U64},
};
use fee_sentinel::{FeeLimits, FeeLimitsConfig, HttpPriceFeed};
use httpmock::prelude::*;
use url::Url;

pub const GWEI: u64 = 1_000_000_000;
pub const PRICE_PATH: &str = "/api/v3/ticker/price";

pub fn limits(fee_limit_usd: &str, fee_per_gas_gwei: &str, priority_gwei: &str) -> FeeLimits {
    FeeLimits::try_from(FeeLimitsConfig {
        fee_limit_usd: Some(fee_limit_usd.to_owned()),
        fee_per_gas_limit_gwei: Some(fee_per_gas_gwei.to_owned()),
        priority_fee_per_gas_limit_gwei: Some(priority_gwei.to_owned()),
        ..FeeLimitsConfig::default()
    })
    .unwrap()
}

/// A node that answers one estimation: `eth_estimateGas`, then `eth_getBlockByNumber` and
/// `eth_gasPrice`.
pub fn mocked_node(
    estimated_gas: u64,
    base_fee_gwei: u64,
    gas_price_gwei: u64,
) -> Provider<MockProvider> {
    let (provider, mock) = Provider::mocked();
    // Responses are served last-in first-out.
    mock.push(U256::from(gas_price_gwei * GWEI)).unwrap();
    mock.push(Block::<TxHash> {
        number: Some(U64::from(19_000_000)),
        base_fee_per_gas: Some(U256::from(base_fee_gwei * GWEI)),
        ..Default::default()
    })
    .unwrap();
    mock.push(U256::from(estimated_gas)).unwrap();
    provider
}

/// A node that only answers the gas price queries.
pub fn mocked_fee_market(base_fee_gwei: u64, gas_price_gwei: u64) -> Provider<MockProvider> {
    let (provider, mock) = Provider::mocked();
    mock.push(U256::from(gas_price_gwei * GWEI)).unwrap();
    mock.push(Block::<TxHash> {
        number: Some(U64::from(19_000_000)),
        base_fee_per_gas: Some(U256::from(base_fee_gwei * GWEI)),
        ..Default::default()
    })
    .unwrap();
    provider
}

pub async fn price_server(body: &'static str) -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PRICE_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;
    server
}

pub fn price_feed(server: &MockServer) -> HttpPriceFeed {
    HttpPriceFeed::new(
        Url::parse(&server.url(PRICE_PATH)).unwrap(),
        reqwest::Client::new(),
    )
}
