//! ZB streaming client.

use crate::error::CoinxError;
use crate::exchanges::zb::decode::{decode_depth, decode_ticker, decode_trades};
use crate::exchanges::zb::endpoints::{WS_URL, topics};
use crate::types::{CurrencyPair, Depth, Ticker, Trade};
use crate::ws::{
    ConnectionState, Connector, Multiplexer, StreamProtocol, TungsteniteConnector, WsConfig,
};

/// ZB channel naming: the logical name `btc_usdt_ticker` becomes the wire
/// channel `btcusdt_ticker` (the first `_` is dropped).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZbProtocol;

impl StreamProtocol for ZbProtocol {
    fn channel_id(&self, logical_name: &str) -> String {
        logical_name.replacen('_', "", 1)
    }
}

/// Logical channel name of a topic on a pair, e.g. `btc_usdt_ticker`.
pub fn channel_name(pair: &CurrencyPair, topic: &str) -> String {
    format!("{pair}_{topic}")
}

/// Typed subscriptions to ZB market data streams.
///
/// Wraps a [`Multiplexer`], so all subscriptions share one connection.
pub struct ZbStreamClient<C = TungsteniteConnector> {
    mux: Multiplexer<ZbProtocol, C>,
}

impl<C> Clone for ZbStreamClient<C> {
    fn clone(&self) -> Self {
        Self {
            mux: self.mux.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ZbStreamClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZbStreamClient")
            .field("mux", &self.mux)
            .finish()
    }
}

impl ZbStreamClient {
    /// Create a client for the production endpoint.
    pub fn new() -> Self {
        Self::with_url(WS_URL)
    }

    /// Create a client with a custom URL (useful for testing).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::with_config(url, WsConfig::default())
    }

    /// Create a client with a custom URL and configuration.
    pub fn with_config(url: impl Into<String>, config: WsConfig) -> Self {
        Self {
            mux: Multiplexer::with_config(url, ZbProtocol, config),
        }
    }
}

impl Default for ZbStreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> ZbStreamClient<C> {
    /// Create a client with a custom transport.
    pub fn with_connector(url: impl Into<String>, config: WsConfig, connector: C) -> Self {
        Self {
            mux: Multiplexer::with_connector(url, ZbProtocol, config, connector),
        }
    }

    /// The underlying multiplexer.
    pub fn multiplexer(&self) -> &Multiplexer<ZbProtocol, C> {
        &self.mux
    }

    /// Open the connection. See [`Multiplexer::connect`].
    pub async fn connect(&self) -> Result<(), CoinxError> {
        self.mux.connect().await
    }

    /// Close the connection. See [`Multiplexer::disconnect`].
    pub async fn disconnect(&self) {
        self.mux.disconnect().await
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.mux.state().await
    }

    /// Stream tickers of a pair. Returns the wire channel id.
    pub async fn subscribe_ticker<F>(
        &self,
        pair: &CurrencyPair,
        callback: F,
    ) -> Result<String, CoinxError>
    where
        F: Fn(Ticker) + Send + Sync + 'static,
    {
        self.mux
            .subscribe(&channel_name(pair, topics::TICKER), decode_ticker, callback)
            .await
    }

    /// Stream order book snapshots of a pair. Returns the wire channel id.
    pub async fn subscribe_depth<F>(
        &self,
        pair: &CurrencyPair,
        callback: F,
    ) -> Result<String, CoinxError>
    where
        F: Fn(Depth) + Send + Sync + 'static,
    {
        self.mux
            .subscribe(&channel_name(pair, topics::DEPTH), decode_depth, callback)
            .await
    }

    /// Stream batches of public trades of a pair. Returns the wire channel id.
    pub async fn subscribe_trades<F>(
        &self,
        pair: &CurrencyPair,
        callback: F,
    ) -> Result<String, CoinxError>
    where
        F: Fn(Vec<Trade>) + Send + Sync + 'static,
    {
        self.mux
            .subscribe(&channel_name(pair, topics::TRADES), decode_trades, callback)
            .await
    }
}
