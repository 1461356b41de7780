//! Huobi REST client.

use std::time::Duration;

use crate::classify::ErrorClassifier;
use crate::error::CoinxError;
use crate::exchanges::huobi::codes::classifier;
use crate::exchanges::huobi::decode;
use crate::rest::{HttpClient, endpoint_url};
use crate::types::{CurrencyPair, Kline, QueryParams, Ticker};

/// Base URL of the Huobi API.
pub const BASE_URL: &str = "https://api.huobi.pro";

/// Market data endpoints.
pub mod endpoints {
    /// Candles.
    pub const KLINE: &str = "/market/history/kline";
    /// Aggregated ticker.
    pub const MERGED_DETAIL: &str = "/market/detail/merged";
}

/// Huobi symbol of a pair: `btcusdt`.
pub fn symbol(pair: &CurrencyPair) -> String {
    pair.concatenated()
}

/// Client for the Huobi market data API.
///
/// # Example
///
/// ```rust,no_run
/// use coinx::exchanges::huobi::HuobiRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HuobiRestClient::new();
///     let klines = client.get_klines(&"btc_usdt".parse()?, "1min", 20).await?;
///     println!("{} candles", klines.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HuobiRestClient {
    http: HttpClient,
    base_url: String,
    classifier: ErrorClassifier,
}

impl HuobiRestClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> HuobiRestClientBuilder {
        HuobiRestClientBuilder::new()
    }

    /// The latest `size` candles of `period` (e.g. `1min`, `60min`, `1day`).
    pub async fn get_klines(
        &self,
        pair: &CurrencyPair,
        period: &str,
        size: u16,
    ) -> Result<Vec<Kline>, CoinxError> {
        let params = QueryParams::new()
            .with("symbol", symbol(pair))
            .with("period", period)
            .with("size", size);
        let body = self.get(endpoints::KLINE, params).await?;
        decode::decode_klines(&body)
    }

    /// Aggregated 24h ticker with best bid and ask.
    pub async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker, CoinxError> {
        let params = QueryParams::new().with("symbol", symbol(pair));
        let body = self.get(endpoints::MERGED_DETAIL, params).await?;
        decode::decode_ticker(&body)
    }

    async fn get(&self, endpoint: &str, params: QueryParams) -> Result<Vec<u8>, CoinxError> {
        let body = self
            .http
            .get(&endpoint_url(&self.base_url, endpoint), params)
            .await?;
        self.classifier.classify(&body)?;
        Ok(body)
    }
}

impl Default for HuobiRestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`HuobiRestClient`].
#[derive(Debug, Clone)]
pub struct HuobiRestClientBuilder {
    base_url: String,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    max_retries: u32,
}

impl HuobiRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: None,
            timeout: None,
            max_retries: 0,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> HuobiRestClient {
        let mut http = HttpClient::builder().max_retries(self.max_retries);
        if let Some(user_agent) = self.user_agent {
            http = http.user_agent(user_agent);
        }
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        HuobiRestClient {
            http: http.build(),
            base_url: self.base_url,
            classifier: classifier(),
        }
    }
}

impl Default for HuobiRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
