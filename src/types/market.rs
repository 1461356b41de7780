//! Canonical market data: tickers, candles, trades and order books.
//!
//! Every exchange integration decodes its own wire format into these types.
//! Prices and amounts are [`Decimal`]; times are Unix milliseconds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TradeType;

/// 24h market summary for one pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Traded volume over the window.
    pub amount: Decimal,
    /// Last traded price.
    pub last: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Best bid.
    pub bid: Decimal,
    /// Highest price over the window.
    pub high: Decimal,
    /// Lowest price over the window.
    pub low: Decimal,
    /// Snapshot time in milliseconds.
    pub time: u64,
}

/// One candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    /// Traded volume within the candle.
    pub amount: Decimal,
    /// Candle open time in milliseconds.
    pub time: u64,
}

/// A public trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade id.
    pub id: u64,
    /// Taker side.
    pub trade_type: TradeType,
    pub price: Decimal,
    pub amount: Decimal,
    /// Trade time in milliseconds.
    pub time: u64,
}

/// A price level in an order book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthEntry {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Order book snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    /// Sell side, as sent by the exchange.
    pub asks: Vec<DepthEntry>,
    /// Buy side, as sent by the exchange.
    pub bids: Vec<DepthEntry>,
    /// Snapshot time in milliseconds.
    pub time: u64,
}

impl Depth {
    /// Lowest ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|e| e.price).min()
    }

    /// Highest bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|e| e.price).max()
    }
}

/// Precision rules for a tradable symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Decimal places allowed in order amounts.
    pub amount_scale: u8,
    /// Decimal places allowed in order prices.
    pub price_scale: u8,
}
