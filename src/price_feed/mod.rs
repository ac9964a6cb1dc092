use crate::{errors::PriceFeedError, units::ExchangeRate};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::value::RawValue;
use std::{collections::HashMap, fmt::Debug, str::FromStr};
use url::Url;

pub const DEFAULT_PRICE_FIELD: &str = "price";

/// Source of the ether to fiat exchange rate.
#[async_trait]
pub trait FiatPriceOracle: Sync + Send + Debug {
    /// Returns the current price of one ether. Every call is a fresh fetch.
    async fn fetch_rate(&self) -> Result<ExchangeRate, PriceFeedError>;
}

/// Price feed served over HTTP as a JSON object holding the price in one of its fields.
#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    url: Url,
    price_field: String,
    client: reqwest::Client,
}

impl HttpPriceFeed {
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        Self {
            url,
            price_field: DEFAULT_PRICE_FIELD.to_owned(),
            client,
        }
    }

    pub fn with_price_field(mut self, price_field: impl Into<String>) -> Self {
        self.price_field = price_field.into();
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FiatPriceOracle for HttpPriceFeed {
    async fn fetch_rate(&self) -> Result<ExchangeRate, PriceFeedError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PriceFeedError::StatusError {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;
        let rate = parse_price(&body, &self.price_field)?;
        log::debug!("ethToUsd: {rate} (from {})", self.url);
        Ok(rate)
    }
}

/// Reads `field` out of a JSON object without going through a binary float, so every digit
/// the feed sent is kept. Both `{"price": 3000.12}` and `{"price": "3000.12"}` are accepted.
pub fn parse_price(body: &str, field: &str) -> Result<ExchangeRate, PriceFeedError> {
    let fields: HashMap<String, Box<RawValue>> = serde_json::from_str(body)?;
    let raw = fields
        .get(field)
        .ok_or_else(|| PriceFeedError::MissingPrice(field.to_owned()))?
        .get()
        .trim();
    let text = raw
        .strip_prefix('"')
        .and_then(|quoted| quoted.strip_suffix('"'))
        .unwrap_or(raw);
    let rate = BigDecimal::from_str(text).map_err(|err| PriceFeedError::InvalidPrice {
        value: raw.to_owned(),
        reason: err.to_string(),
    })?;
    ExchangeRate::new(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn feed(server: &MockServer, path: &str) -> HttpPriceFeed {
        HttpPriceFeed::new(
            Url::parse(&server.url(path)).unwrap(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_parse_price_keeps_every_digit() {
        let rate = parse_price(r#"{"price": 3000.123456789012345678901}"#, "price").unwrap();
        assert_eq!(rate.as_decimal(), &dec("3000.123456789012345678901"));

        let rate = parse_price(r#"{"symbol": "ETHUSD", "price": "2999.5"}"#, "price").unwrap();
        assert_eq!(rate.as_decimal(), &dec("2999.5"));
    }

    #[test]
    fn test_parse_price_errors() {
        assert!(matches!(
            parse_price(r#"{"last": 3000}"#, "price"),
            Err(PriceFeedError::MissingPrice(field)) if field == "price"
        ));
        assert!(matches!(
            parse_price(r#"{"price": null}"#, "price"),
            Err(PriceFeedError::InvalidPrice { .. })
        ));
        assert!(matches!(
            parse_price(r#"{"price": 0}"#, "price"),
            Err(PriceFeedError::NonPositiveRate(_))
        ));
        assert!(matches!(
            parse_price("<html>", "price"),
            Err(PriceFeedError::DecodeError(_))
        ));
    }

    #[test]
    fn test_parse_price_rejects_extreme_exponents() {
        assert!(matches!(
            parse_price(r#"{"price": "1e-200000000"}"#, "price"),
            Err(PriceFeedError::RateOutOfRange { scale: 200_000_000 })
        ));
        assert!(matches!(
            parse_price(r#"{"price": 1e200000000}"#, "price"),
            Err(PriceFeedError::RateOutOfRange { .. })
        ));
        assert!(parse_price(r#"{"price": 3.0e3}"#, "price").is_ok());
    }

    #[tokio::test]
    async fn test_happy_day() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v3/ticker/price");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"symbol":"ETHUSDT","price":"3000.00"}"#);
            })
            .await;

        let rate = feed(&server, "/api/v3/ticker/price")
            .fetch_rate()
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rate.as_decimal(), &dec("3000"));
    }

    #[tokio::test]
    async fn test_custom_price_field() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/eth");
                then.status(200).body(r#"{"usd": 3120.5}"#);
            })
            .await;

        let rate = feed(&server, "/eth")
            .with_price_field("usd")
            .fetch_rate()
            .await
            .unwrap();

        assert_eq!(rate.as_decimal(), &dec("3120.5"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/eth");
                then.status(503).body("maintenance");
            })
            .await;

        let err = feed(&server, "/eth").fetch_rate().await.unwrap_err();

        assert!(matches!(
            err,
            PriceFeedError::StatusError { ref body, .. } if body == "maintenance"
        ));
        assert!(err.to_string().starts_with(
            "Http error while fetching price. Status: 503 Service Unavailable"
        ));
    }

    #[tokio::test]
    async fn test_every_call_fetches_again() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/eth");
                then.status(200).body(r#"{"price": 3000}"#);
            })
            .await;
        let feed = feed(&server, "/eth");

        feed.fetch_rate().await.unwrap();
        feed.fetch_rate().await.unwrap();

        mock.assert_hits_async(2).await;
    }
}
