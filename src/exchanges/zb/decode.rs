//! ZB wire formats and their conversion to canonical types.
//!
//! ZB mixes string-encoded and plain JSON numbers freely, so every numeric
//! field goes through the lenient helpers: a missing or malformed field
//! decodes as zero rather than failing the payload. The same decoders serve
//! REST bodies and streaming frames, which share their layouts.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::CoinxError;
use crate::types::serde_helpers::{
    decimal_from_value, lenient_bool, lenient_decimal, lenient_i64, lenient_string, lenient_u8,
    lenient_u64, u64_from_value,
};
use crate::types::{
    Account, Asset, Coin, Depth, DepthEntry, Kline, Order, OrderStatus, SymbolConfig, Ticker,
    Trade, TradeType,
};

// ZB reports trade and order book times in seconds.
const MILLIS_PER_SECOND: u64 = 1_000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSymbol {
    #[serde(default, deserialize_with = "lenient_u8::deserialize")]
    amount_scale: u8,
    #[serde(default, deserialize_with = "lenient_u8::deserialize")]
    price_scale: u8,
}

/// Decode the `markets` response: symbol → precision settings.
pub fn decode_symbols(body: &[u8]) -> Result<HashMap<String, SymbolConfig>, CoinxError> {
    let markets: HashMap<String, WireSymbol> = serde_json::from_slice(body)?;
    Ok(markets
        .into_iter()
        .map(|(symbol, wire)| {
            (
                symbol,
                SymbolConfig {
                    amount_scale: wire.amount_scale,
                    price_scale: wire.price_scale,
                },
            )
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct WireTickerFields {
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    vol: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    last: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    sell: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    buy: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    high: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    low: Decimal,
}

#[derive(Debug, Deserialize)]
struct WireTicker {
    #[serde(default)]
    ticker: WireTickerFields,
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    date: u64,
}

/// Decode a ticker response or `<pair>_ticker` frame.
pub fn decode_ticker(body: &[u8]) -> Result<Ticker, CoinxError> {
    let wire: WireTicker = serde_json::from_slice(body)?;
    Ok(Ticker {
        amount: wire.ticker.vol,
        last: wire.ticker.last,
        ask: wire.ticker.sell,
        bid: wire.ticker.buy,
        high: wire.ticker.high,
        low: wire.ticker.low,
        time: wire.date,
    })
}

#[derive(Debug, Deserialize)]
struct WireKlines {
    #[serde(default)]
    data: Vec<Value>,
}

/// Decode a `kline` response. Rows are `[time, open, high, low, close, amount]`.
pub fn decode_klines(body: &[u8]) -> Result<Vec<Kline>, CoinxError> {
    let wire: WireKlines = serde_json::from_slice(body)?;
    Ok(wire
        .data
        .iter()
        .map(|row| {
            let row = row.as_array().map(Vec::as_slice).unwrap_or_default();
            Kline {
                time: row.first().and_then(u64_from_value).unwrap_or(0),
                open: decimal_at(row, 1),
                high: decimal_at(row, 2),
                low: decimal_at(row, 3),
                close: decimal_at(row, 4),
                amount: decimal_at(row, 5),
            }
        })
        .collect())
}

fn decimal_at(row: &[Value], index: usize) -> Decimal {
    row.get(index)
        .and_then(decimal_from_value)
        .unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Deserialize)]
struct WireTrade {
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    tid: u64,
    #[serde(default, rename = "type", deserialize_with = "lenient_string::deserialize")]
    trade_type: String,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    price: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    amount: Decimal,
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    date: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTrades {
    List(Vec<WireTrade>),
    Frame {
        #[serde(default)]
        data: Vec<WireTrade>,
    },
}

/// Decode a `trades` response (a bare array) or a `<pair>_trades` frame
/// (`{"data":[...]}`).
///
/// Trades with an unrecognized side are dropped.
pub fn decode_trades(body: &[u8]) -> Result<Vec<Trade>, CoinxError> {
    let trades = match serde_json::from_slice::<WireTrades>(body)? {
        WireTrades::List(trades) | WireTrades::Frame { data: trades } => trades,
    };
    Ok(trades
        .into_iter()
        .filter_map(|wire| match wire.trade_type.parse::<TradeType>() {
            Ok(trade_type) => Some(Trade {
                id: wire.tid,
                trade_type,
                price: wire.price,
                amount: wire.amount,
                time: wire.date.saturating_mul(MILLIS_PER_SECOND),
            }),
            Err(_) => {
                warn!(tid = wire.tid, trade_type = %wire.trade_type, "Dropping trade with unknown side");
                None
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct WireDepth {
    #[serde(default)]
    asks: Vec<Value>,
    #[serde(default)]
    bids: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    timestamp: u64,
}

/// Decode a `depth` response or `<pair>_depth` frame. Levels are
/// `[price, amount]` and keep the exchange's ordering.
pub fn decode_depth(body: &[u8]) -> Result<Depth, CoinxError> {
    let wire: WireDepth = serde_json::from_slice(body)?;
    Ok(Depth {
        asks: depth_entries(&wire.asks),
        bids: depth_entries(&wire.bids),
        time: wire.timestamp.saturating_mul(MILLIS_PER_SECOND),
    })
}

fn depth_entries(levels: &[Value]) -> Vec<DepthEntry> {
    levels
        .iter()
        .map(|level| {
            let level = level.as_array().map(Vec::as_slice).unwrap_or_default();
            DepthEntry {
                price: decimal_at(level, 0),
                amount: decimal_at(level, 1),
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCoin {
    #[serde(default, rename = "freez", deserialize_with = "lenient_decimal::deserialize")]
    freeze: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    available: Decimal,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    cn_name: String,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    en_name: String,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    key: String,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    unit_tag: String,
    #[serde(default, deserialize_with = "lenient_u8::deserialize")]
    unit_decimal: u8,
}

#[derive(Debug, Default, Deserialize)]
struct WireBase {
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    username: String,
    #[serde(default, deserialize_with = "lenient_bool::deserialize")]
    trade_password_enabled: bool,
    #[serde(default, deserialize_with = "lenient_bool::deserialize")]
    auth_google_enabled: bool,
    #[serde(default, deserialize_with = "lenient_bool::deserialize")]
    auth_mobile_enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct WireAccountResult {
    #[serde(default)]
    coins: Vec<WireCoin>,
    #[serde(default)]
    base: WireBase,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    #[serde(default)]
    result: WireAccountResult,
}

/// Decode a `getAccountInfo` response.
pub fn decode_account(body: &[u8]) -> Result<Account, CoinxError> {
    let wire: WireAccount = serde_json::from_slice(body)?;
    let WireAccountResult { coins, base } = wire.result;
    Ok(Account {
        username: base.username,
        trade_password_enabled: base.trade_password_enabled,
        auth_google_enabled: base.auth_google_enabled,
        auth_mobile_enabled: base.auth_mobile_enabled,
        assets: coins
            .into_iter()
            .map(|coin| Asset {
                freeze: coin.freeze,
                available: coin.available,
                coin: Coin {
                    cn_name: coin.cn_name,
                    en_name: coin.en_name,
                    key: coin.key,
                    unit: coin.unit_tag,
                    scale: coin.unit_decimal,
                },
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
struct WireOrderId {
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    id: u64,
}

/// Decode the id of a newly placed order.
pub fn decode_order_id(body: &[u8]) -> Result<u64, CoinxError> {
    let wire: WireOrderId = serde_json::from_slice(body)?;
    match wire.id {
        0 => Err(CoinxError::InvalidResponse(
            "order response carries no id".to_string(),
        )),
        id => Ok(id),
    }
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    id: u64,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    currency: String,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    price: Decimal,
    #[serde(default, deserialize_with = "lenient_i64::deserialize")]
    status: i64,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    total_amount: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    trade_amount: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    trade_price: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
    trade_money: Decimal,
    #[serde(default, deserialize_with = "lenient_u64::deserialize")]
    trade_date: u64,
    #[serde(default = "unknown_side", rename = "type", deserialize_with = "lenient_i64::deserialize")]
    trade_type: i64,
}

fn unknown_side() -> i64 {
    -1
}

impl TryFrom<WireOrder> for Order {
    type Error = CoinxError;

    fn try_from(wire: WireOrder) -> Result<Self, Self::Error> {
        let trade_type = TradeType::from_code(wire.trade_type).ok_or_else(|| {
            CoinxError::InvalidResponse(format!(
                "order {} has unknown trade type {}",
                wire.id, wire.trade_type
            ))
        })?;
        Ok(Order {
            id: wire.id,
            price: wire.price,
            average: wire.trade_price,
            total_amount: wire.total_amount,
            trade_amount: wire.trade_amount,
            trade_money: wire.trade_money,
            symbol: wire.currency,
            status: OrderStatus::from_code(wire.status),
            trade_type,
            time: wire.trade_date,
        })
    }
}

/// Decode a `getOrder` response.
pub fn decode_order(body: &[u8]) -> Result<Order, CoinxError> {
    let wire: WireOrder = serde_json::from_slice(body)?;
    Order::try_from(wire)
}

/// Decode a `getOrdersIgnoreTradeType` / `getOrdersNew` response.
///
/// Orders with an unrecognized side are dropped.
pub fn decode_orders(body: &[u8]) -> Result<Vec<Order>, CoinxError> {
    let wire: Vec<WireOrder> = serde_json::from_slice(body)?;
    Ok(wire
        .into_iter()
        .filter_map(|order| match Order::try_from(order) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(error = %e, "Dropping order");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decode_ticker_frame() {
        let frame = br#"{"channel":"btcusdt_ticker","date":"1516868838012","ticker":{"vol":"1234.5","last":"9000.5","sell":"9001","buy":"9000","high":"9500","low":"8800"}}"#;
        let ticker = decode_ticker(frame).unwrap();
        assert_eq!(ticker.last, Decimal::new(90005, 1));
        assert_eq!(ticker.ask, dec("9001"));
        assert_eq!(ticker.bid, dec("9000"));
        assert_eq!(ticker.amount, dec("1234.5"));
        assert_eq!(ticker.time, 1_516_868_838_012);
    }

    #[test]
    fn test_decode_ticker_tolerates_missing_fields() {
        let ticker = decode_ticker(br#"{"ticker":{"last":"abc"}}"#).unwrap();
        assert_eq!(ticker, Ticker::default());
        assert!(decode_ticker(b"not json").is_err());
    }

    #[test]
    fn test_decode_symbols() {
        let body = br#"{"btc_usdt":{"amountScale":4,"priceScale":2},"eth_btc":{"amountScale":"3"}}"#;
        let symbols = decode_symbols(body).unwrap();
        assert_eq!(
            symbols["btc_usdt"],
            SymbolConfig {
                amount_scale: 4,
                price_scale: 2
            }
        );
        assert_eq!(symbols["eth_btc"].amount_scale, 3);
        assert_eq!(symbols["eth_btc"].price_scale, 0);
    }

    #[test]
    fn test_decode_klines() {
        let body = br#"{"data":[[1516029900000,13750.5,13800,13700.1,13790,12.5],[1516030200000,"1","2"]],"moneyType":"USDT","symbol":"btc"}"#;
        let klines = decode_klines(body).unwrap();
        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].time, 1_516_029_900_000);
        assert_eq!(klines[0].open, dec("13750.5"));
        assert_eq!(klines[0].high, dec("13800"));
        assert_eq!(klines[0].low, dec("13700.1"));
        assert_eq!(klines[0].close, dec("13790"));
        assert_eq!(klines[0].amount, dec("12.5"));
        assert_eq!(klines[1].high, dec("2"));
        assert!(klines[1].close.is_zero());
    }

    #[test]
    fn test_decode_trades_rest_and_frame() {
        let rest = br#"[{"amount":"0.01","date":1516868838,"price":"9000.5","tid":101,"type":"buy","trade_type":"bid"},{"amount":"1","date":1516868839,"price":"9001","tid":102,"type":"sell"}]"#;
        let trades = decode_trades(rest).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, 101);
        assert_eq!(trades[0].trade_type, TradeType::Buy);
        assert_eq!(trades[0].price, dec("9000.5"));
        assert_eq!(trades[0].time, 1_516_868_838_000);
        assert_eq!(trades[1].trade_type, TradeType::Sell);

        let frame = br#"{"channel":"btcusdt_trades","data":[{"amount":"2","date":1,"price":"3","tid":"7","type":"sell"}]}"#;
        let trades = decode_trades(frame).unwrap();
        assert_eq!(trades[0].id, 7);
        assert_eq!(trades[0].amount, dec("2"));
    }

    #[test]
    fn test_decode_trades_drops_unknown_side() {
        let body = br#"[{"tid":1,"type":"hold"},{"tid":2,"type":"buy"}]"#;
        let trades = decode_trades(body).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, 2);
    }

    #[test]
    fn test_decode_depth() {
        let body = br#"{"asks":[[9010.5,0.2],["9011","1.5"]],"bids":[[9000,3]],"timestamp":1516868838}"#;
        let depth = decode_depth(body).unwrap();
        assert_eq!(depth.asks.len(), 2);
        assert_eq!(depth.asks[1].price, dec("9011"));
        assert_eq!(depth.asks[1].amount, dec("1.5"));
        assert_eq!(depth.bids[0].amount, dec("3"));
        assert_eq!(depth.time, 1_516_868_838_000);
        assert_eq!(depth.best_ask(), Some(dec("9010.5")));
    }

    #[test]
    fn test_decode_account() {
        let body = r#"{"result":{"coins":[{"freez":"0.5","available":"1.25","cnName":"比特币","enName":"BTC","key":"btc","unitTag":"฿","unitDecimal":8}],"base":{"username":"alice","trade_password_enabled":true,"auth_google_enabled":false,"auth_mobile_enabled":true}}}"#;
        let account = decode_account(body.as_bytes()).unwrap();
        assert_eq!(account.username, "alice");
        assert!(account.trade_password_enabled);
        assert!(!account.auth_google_enabled);
        assert!(account.auth_mobile_enabled);
        let btc = account.asset("btc").unwrap();
        assert_eq!(btc.freeze, dec("0.5"));
        assert_eq!(btc.available, dec("1.25"));
        assert_eq!(btc.coin.en_name, "BTC");
        assert_eq!(btc.coin.unit, "฿");
        assert_eq!(btc.coin.scale, 8);
    }

    #[test]
    fn test_decode_order() {
        let body = br#"{"currency":"btc_usdt","id":"20180122123","price":15000,"status":3,"total_amount":0.1,"trade_amount":0.04,"trade_price":14999.5,"trade_money":599.98,"trade_date":1516868838012,"type":0}"#;
        let order = decode_order(body).unwrap();
        assert_eq!(order.id, 20_180_122_123);
        assert_eq!(order.symbol, "btc_usdt");
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.trade_type, TradeType::Sell);
        assert_eq!(order.average, dec("14999.5"));
        assert_eq!(order.trade_money, dec("599.98"));
        assert_eq!(order.time, 1_516_868_838_012);
    }

    #[test]
    fn test_decode_order_rejects_unknown_side() {
        assert!(decode_order(br#"{"id":"1","type":5}"#).is_err());
        assert!(decode_order(br#"{"id":"1"}"#).is_err());
    }

    #[test]
    fn test_decode_orders() {
        let body = br#"[{"id":"1","type":1,"status":0},{"id":"2","type":9},{"id":"3","type":0,"status":7}]"#;
        let orders = decode_orders(body).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[1].status, OrderStatus::Unknown);
    }

    #[test]
    fn test_decode_order_id() {
        assert_eq!(
            decode_order_id(br#"{"code":1000,"message":"ok","id":"20180122612810"}"#).unwrap(),
            20_180_122_612_810
        );
        assert!(decode_order_id(br#"{"code":1000}"#).is_err());
    }
}
