//! Common domain types shared by every exchange integration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoinxError;

/// A currency symbol, e.g. `btc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency {
    /// Symbol as used by the exchange.
    pub symbol: String,
}

impl Currency {
    /// Create a currency from its symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// An ordered pair of currencies: the traded base and the currency it is
/// valued in.
///
/// The textual form is `<base>_<valuation>`, e.g. `btc_usdt`.
///
/// ```rust
/// use coinx::types::CurrencyPair;
///
/// let pair: CurrencyPair = "btc_usdt".parse().unwrap();
/// assert_eq!(pair.base.symbol, "btc");
/// assert_eq!(pair.valuation.symbol, "usdt");
/// assert_eq!(pair.to_string(), "btc_usdt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    /// The traded currency.
    pub base: Currency,
    /// The currency prices are quoted in.
    pub valuation: Currency,
}

impl CurrencyPair {
    /// Create a pair from two symbols.
    pub fn new(base: impl Into<String>, valuation: impl Into<String>) -> Self {
        Self {
            base: Currency::new(base),
            valuation: Currency::new(valuation),
        }
    }

    /// The pair with the separator dropped, e.g. `btcusdt`.
    pub fn concatenated(&self) -> String {
        format!("{}{}", self.base, self.valuation)
    }
}

impl FromStr for CurrencyPair {
    type Err = CoinxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((base, valuation))
                if !base.is_empty() && !valuation.is_empty() && !valuation.contains('_') =>
            {
                Ok(Self::new(base, valuation))
            }
            _ => Err(CoinxError::InvalidArgument(format!(
                "currency pair must look like base_valuation, got {s:?}"
            ))),
        }
    }
}

impl std::fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.base, self.valuation)
    }
}

/// Buy or sell side of a trade or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// Buy side
    Buy,
    /// Sell side
    Sell,
}

impl TradeType {
    /// Numeric code used by exchanges that encode the side as an integer
    /// (`1` buy, `0` sell).
    pub fn as_code(&self) -> i64 {
        match self {
            TradeType::Buy => 1,
            TradeType::Sell => 0,
        }
    }

    /// Parse the numeric side code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TradeType::Buy),
            0 => Some(TradeType::Sell),
            _ => None,
        }
    }
}

impl FromStr for TradeType {
    type Err = CoinxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeType::Buy),
            "sell" => Ok(TradeType::Sell),
            other => Err(CoinxError::InvalidArgument(format!(
                "unknown trade type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

/// Status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is open and waiting to be filled
    Pending,
    /// Order has been cancelled
    Cancelled,
    /// Order has been completely filled
    Finished,
    /// Order has been partially filled
    PartiallyFilled,
    /// Status code not recognized
    #[default]
    Unknown,
}

impl OrderStatus {
    /// Parse the numeric status code (`0` pending, `1` cancelled,
    /// `2` finished, `3` partially filled).
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => OrderStatus::Pending,
            1 => OrderStatus::Cancelled,
            2 => OrderStatus::Finished,
            3 => OrderStatus::PartiallyFilled,
            _ => OrderStatus::Unknown,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Finished => write!(f, "finished"),
            OrderStatus::PartiallyFilled => write!(f, "partially_filled"),
            OrderStatus::Unknown => write!(f, "unknown"),
        }
    }
}
