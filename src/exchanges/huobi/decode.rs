//! Huobi wire formats.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoinxError;
use crate::types::serde_helpers::{decimal_from_value, lenient_decimal, lenient_u64};
use crate::types::{Kline, Ticker};

#[derive(Debug, Deserialize)]
struct WireKline {
    /// Candle open time, in seconds.
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    id: u64,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    open: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    close: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    low: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    high: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct WireKlines {
    #[serde(default)]
    data: Vec<WireKline>,
}

/// Decode a `/market/history/kline` response.
pub fn decode_klines(body: &[u8]) -> Result<Vec<Kline>, CoinxError> {
    let wire: WireKlines = serde_json::from_slice(body)?;
    Ok(wire
        .data
        .into_iter()
        .map(|k| Kline {
            open: k.open,
            close: k.close,
            high: k.high,
            low: k.low,
            amount: k.amount,
            time: k.id.saturating_mul(1_000),
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct WireTick {
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    amount: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    close: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    high: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    low: Decimal,
    /// `[price, size]`
    #[serde(default)]
    ask: Vec<Value>,
    /// `[price, size]`
    #[serde(default)]
    bid: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WireTicker {
    #[serde(default)]
    tick: WireTick,
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    ts: u64,
}

fn best_price(level: &[Value]) -> Decimal {
    level
        .first()
        .and_then(decimal_from_value)
        .unwrap_or(Decimal::ZERO)
}

/// Decode a `/market/detail/merged` response.
pub fn decode_ticker(body: &[u8]) -> Result<Ticker, CoinxError> {
    let wire: WireTicker = serde_json::from_slice(body)?;
    Ok(Ticker {
        amount: wire.tick.amount,
        last: wire.tick.close,
        ask: best_price(&wire.tick.ask),
        bid: best_price(&wire.tick.bid),
        high: wire.tick.high,
        low: wire.tick.low,
        time: wire.ts,
    })
}
