//! Canonical account and order types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderStatus, TradeType};

/// Account profile with balances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub trade_password_enabled: bool,
    pub auth_google_enabled: bool,
    pub auth_mobile_enabled: bool,
    /// One entry per currency held.
    pub assets: Vec<Asset>,
}

impl Account {
    /// Balance entry for a currency key (e.g. `btc`), if present.
    pub fn asset(&self, key: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.coin.key.eq_ignore_ascii_case(key))
    }
}

/// Balance of one currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Amount locked in open orders.
    pub freeze: Decimal,
    /// Amount free to trade or withdraw.
    pub available: Decimal,
    pub coin: Coin,
}

impl Asset {
    /// Frozen plus available.
    pub fn total(&self) -> Decimal {
        self.freeze + self.available
    }
}

/// Currency metadata attached to a balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Chinese display name.
    pub cn_name: String,
    /// English display name.
    pub en_name: String,
    /// Currency key, e.g. `btc`.
    pub key: String,
    /// Unit tag shown next to amounts.
    pub unit: String,
    /// Decimal places of the currency.
    pub scale: u8,
}

/// An order as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Limit price.
    pub price: Decimal,
    /// Average fill price.
    pub average: Decimal,
    /// Ordered amount.
    pub total_amount: Decimal,
    /// Filled amount.
    pub trade_amount: Decimal,
    /// Filled value in the valuation currency.
    pub trade_money: Decimal,
    /// Pair in exchange notation.
    pub symbol: String,
    pub status: OrderStatus,
    pub trade_type: TradeType,
    /// Creation time in milliseconds.
    pub time: u64,
}

impl Order {
    /// Amount still waiting to be filled.
    pub fn remaining_amount(&self) -> Decimal {
        (self.total_amount - self.trade_amount).max(Decimal::ZERO)
    }

    /// Whether the order can still fill.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::PartiallyFilled
        )
    }
}
