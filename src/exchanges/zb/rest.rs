//! ZB REST client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use crate::auth::{CredentialsProvider, Signer, TimestampProvider};
use crate::classify::ErrorClassifier;
use crate::error::CoinxError;
use crate::exchanges::zb::codes::{data_api_classifier, trade_api_classifier};
use crate::exchanges::zb::decode;
use crate::exchanges::zb::endpoints::{
    DATA_API_URL, SIGNATURE_KEY, TIMESTAMP_KEY, TRADE_API_URL, data, trade,
};
use crate::rest::{HttpClient, endpoint_url};
use crate::types::{
    Account, CurrencyPair, Depth, Kline, Order, QueryParams, SymbolConfig, Ticker, Trade,
    TradeType,
};

/// Client for the ZB market data and trade APIs.
///
/// Market data needs no credentials. Trade calls are signed with the
/// configured credentials and fail with [`CoinxError::MissingCredentials`]
/// without them.
///
/// # Example
///
/// ```rust,no_run
/// use coinx::exchanges::zb::ZbRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ZbRestClient::new();
///     let ticker = client.get_ticker(&"btc_usdt".parse()?).await?;
///     println!("last: {}", ticker.last);
///     Ok(())
/// }
/// ```
///
/// For trade endpoints, provide credentials:
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use coinx::auth::EnvCredentials;
/// use coinx::exchanges::zb::ZbRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = EnvCredentials::try_from_env().ok_or("ZB_ACCESS_KEY/ZB_SECRET_KEY not set")?;
///     let client = ZbRestClient::builder()
///         .credentials(Arc::new(credentials))
///         .build();
///
///     let account = client.get_account().await?;
///     println!("{} holds {} currencies", account.username, account.assets.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ZbRestClient {
    http: HttpClient,
    data_url: String,
    trade_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    signer: Signer,
    data_classifier: ErrorClassifier,
    trade_classifier: ErrorClassifier,
}

impl ZbRestClient {
    /// Create a client for market data only.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ZbRestClientBuilder {
        ZbRestClientBuilder::new()
    }

    /// Precision settings of every market, keyed by symbol (`btc_usdt`).
    pub async fn get_symbols(&self) -> Result<HashMap<String, SymbolConfig>, CoinxError> {
        let body = self.data_get(data::MARKETS, QueryParams::new()).await?;
        decode::decode_symbols(&body)
    }

    /// 24h ticker of a pair.
    pub async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker, CoinxError> {
        let params = QueryParams::new().with("market", pair.to_string());
        let body = self.data_get(data::TICKER, params).await?;
        decode::decode_ticker(&body)
    }

    /// Candles of `period` (e.g. `1min`, `15min`, `1hour`, `1day`), starting
    /// at `since` (milliseconds), at most `size` of them.
    pub async fn get_klines(
        &self,
        pair: &CurrencyPair,
        period: &str,
        since: u64,
        size: u16,
    ) -> Result<Vec<Kline>, CoinxError> {
        let params = QueryParams::new()
            .with("market", pair.to_string())
            .with("type", period)
            .with("since", since)
            .with("size", size);
        let body = self.data_get(data::KLINE, params).await?;
        decode::decode_klines(&body)
    }

    /// Public trades after trade id `since` (`0` for the latest).
    pub async fn get_trades(
        &self,
        pair: &CurrencyPair,
        since: u64,
    ) -> Result<Vec<Trade>, CoinxError> {
        let params = QueryParams::new()
            .with("market", pair.to_string())
            .with("since", since);
        let body = self.data_get(data::TRADES, params).await?;
        decode::decode_trades(&body)
    }

    /// Order book with up to `size` levels per side.
    pub async fn get_depth(&self, pair: &CurrencyPair, size: u8) -> Result<Depth, CoinxError> {
        let params = QueryParams::new()
            .with("market", pair.to_string())
            .with("size", size);
        let body = self.data_get(data::DEPTH, params).await?;
        decode::decode_depth(&body)
    }

    /// Account profile and balances.
    pub async fn get_account(&self) -> Result<Account, CoinxError> {
        let body = self
            .trade_get(trade::GET_ACCOUNT_INFO, QueryParams::new())
            .await?;
        decode::decode_account(&body)
    }

    /// Place a limit order and return its id.
    pub async fn place_order(
        &self,
        pair: &CurrencyPair,
        price: Decimal,
        amount: Decimal,
        trade_type: TradeType,
    ) -> Result<u64, CoinxError> {
        if price <= Decimal::ZERO {
            return Err(CoinxError::InvalidArgument(format!(
                "price must be positive, got {price}"
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(CoinxError::InvalidArgument(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let params = QueryParams::new()
            .with("currency", pair.to_string())
            .with("price", price)
            .with("amount", amount)
            .with("tradeType", trade_type.as_code());
        let body = self.trade_get(trade::ORDER, params).await?;
        decode::decode_order_id(&body)
    }

    /// Cancel an order.
    pub async fn cancel_order(&self, pair: &CurrencyPair, id: u64) -> Result<(), CoinxError> {
        let params = QueryParams::new()
            .with("currency", pair.to_string())
            .with("id", id);
        self.trade_get(trade::CANCEL_ORDER, params).await?;
        Ok(())
    }

    /// Look up one order.
    pub async fn get_order(&self, pair: &CurrencyPair, id: u64) -> Result<Order, CoinxError> {
        let params = QueryParams::new()
            .with("currency", pair.to_string())
            .with("id", id);
        let body = self.trade_get(trade::GET_ORDER, params).await?;
        decode::decode_order(&body)
    }

    /// One page of orders, optionally restricted to one side.
    pub async fn get_orders(
        &self,
        pair: &CurrencyPair,
        trade_type: Option<TradeType>,
        page: u64,
        size: u16,
    ) -> Result<Vec<Order>, CoinxError> {
        let mut params = QueryParams::new()
            .with("currency", pair.to_string())
            .with("pageIndex", page)
            .with("pageSize", size);
        let method = match trade_type {
            None => trade::GET_ORDERS_IGNORE_TRADE_TYPE,
            Some(trade_type) => {
                params.insert("tradeType", trade_type.as_code());
                trade::GET_ORDERS_NEW
            }
        };
        let body = self.trade_get(method, params).await?;
        decode::decode_orders(&body)
    }

    async fn data_get(&self, endpoint: &str, params: QueryParams) -> Result<Vec<u8>, CoinxError> {
        let url = endpoint_url(&self.data_url, endpoint);
        let body = self.http.get(&url, params).await?;
        self.data_classifier.classify(&body)?;
        Ok(body)
    }

    async fn trade_get(&self, method: &str, mut params: QueryParams) -> Result<Vec<u8>, CoinxError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(CoinxError::MissingCredentials)?
            .get_credentials();

        params.insert("accesskey", &credentials.access_key);
        params.insert("method", method);
        self.signer.sign(&mut params, credentials.expose_secret());
        debug!(method, "Signed trade request");

        let url = endpoint_url(&self.trade_url, method);
        let body = self.http.get(&url, params).await?;
        self.trade_classifier.classify(&body)?;
        Ok(body)
    }
}

impl Default for ZbRestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ZbRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZbRestClient")
            .field("data_url", &self.data_url)
            .field("trade_url", &self.trade_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Builder for [`ZbRestClient`].
pub struct ZbRestClientBuilder {
    data_url: String,
    trade_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    max_retries: u32,
}

impl ZbRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            data_url: DATA_API_URL.to_string(),
            trade_url: TRADE_API_URL.to_string(),
            credentials: None,
            timestamp_provider: None,
            user_agent: None,
            timeout: None,
            max_retries: 0,
        }
    }

    /// Set the market data base URL (useful for testing with a mock server).
    pub fn data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    /// Set the trade base URL (useful for testing with a mock server).
    pub fn trade_url(mut self, url: impl Into<String>) -> Self {
        self.trade_url = url.into();
        self
    }

    /// Set the credentials provider for trade requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom timestamp provider for signed requests.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
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
    pub fn build(self) -> ZbRestClient {
        let mut http = HttpClient::builder().max_retries(self.max_retries);
        if let Some(user_agent) = self.user_agent {
            http = http.user_agent(user_agent);
        }
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let mut signer = Signer::with_keys(SIGNATURE_KEY, TIMESTAMP_KEY);
        if let Some(provider) = self.timestamp_provider {
            signer = signer.timestamp_provider(provider);
        }

        ZbRestClient {
            http: http.build(),
            data_url: self.data_url,
            trade_url: self.trade_url,
            credentials: self.credentials,
            signer,
            data_classifier: data_api_classifier(),
            trade_classifier: trade_api_classifier(),
        }
    }
}

impl Default for ZbRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
