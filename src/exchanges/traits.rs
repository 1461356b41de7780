//! Exchange-neutral market data access.
//!
//! ```rust,ignore
//! use coinx::exchanges::MarketDataClient;
//!
//! async fn spread<C: MarketDataClient>(client: &C) -> Result<(), coinx::CoinxError> {
//!     let ticker = client.get_ticker(&"btc_usdt".parse()?).await?;
//!     println!("{} / {}", ticker.bid, ticker.ask);
//!     Ok(())
//! }
//! ```

use std::future::Future;

use crate::error::CoinxError;
use crate::exchanges::huobi::HuobiRestClient;
use crate::exchanges::zb::ZbRestClient;
use crate::types::{CurrencyPair, Kline, Ticker};

/// Market data operations every exchange integration offers.
///
/// Kline periods are passed through in the exchange's own notation.
pub trait MarketDataClient: Send + Sync {
    /// 24h ticker of a pair.
    fn get_ticker(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<Ticker, CoinxError>> + Send;

    /// The latest `size` candles of `period`.
    fn get_klines(
        &self,
        pair: &CurrencyPair,
        period: &str,
        size: u16,
    ) -> impl Future<Output = Result<Vec<Kline>, CoinxError>> + Send;
}

impl MarketDataClient for ZbRestClient {
    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker, CoinxError> {
        ZbRestClient::get_ticker(self, pair).await
    }

    async fn get_klines(
        &self,
        pair: &CurrencyPair,
        period: &str,
        size: u16,
    ) -> Result<Vec<Kline>, CoinxError> {
        ZbRestClient::get_klines(self, pair, period, 0, size).await
    }
}

impl MarketDataClient for HuobiRestClient {
    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker, CoinxError> {
        HuobiRestClient::get_ticker(self, pair).await
    }

    async fn get_klines(
        &self,
        pair: &CurrencyPair,
        period: &str,
        size: u16,
    ) -> Result<Vec<Kline>, CoinxError> {
        HuobiRestClient::get_klines(self, pair, period, size).await
    }
}
