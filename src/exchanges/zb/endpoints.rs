//! ZB endpoint constants.

/// Base URL of the public market data API.
pub const DATA_API_URL: &str = "https://api.zb.com/data/v1";

/// Base URL of the signed trade API.
pub const TRADE_API_URL: &str = "https://trade.zb.com/api";

/// Streaming endpoint.
pub const WS_URL: &str = "wss://api.zb.com:9999/websocket";

/// Query parameter carrying the request signature.
pub const SIGNATURE_KEY: &str = "sign";

/// Query parameter carrying the request timestamp.
pub const TIMESTAMP_KEY: &str = "reqTime";

/// Market data endpoints (no authentication required).
pub mod data {
    /// Precision settings of every market.
    pub const MARKETS: &str = "markets";
    /// 24h ticker.
    pub const TICKER: &str = "ticker";
    /// Candles.
    pub const KLINE: &str = "kline";
    /// Recent public trades.
    pub const TRADES: &str = "trades";
    /// Order book.
    pub const DEPTH: &str = "depth";
}

/// Trade endpoints. The path doubles as the signed `method` parameter.
pub mod trade {
    pub const GET_ACCOUNT_INFO: &str = "getAccountInfo";
    pub const ORDER: &str = "order";
    pub const CANCEL_ORDER: &str = "cancelOrder";
    pub const GET_ORDER: &str = "getOrder";
    /// Order list across both sides.
    pub const GET_ORDERS_IGNORE_TRADE_TYPE: &str = "getOrdersIgnoreTradeType";
    /// Order list filtered by side.
    pub const GET_ORDERS_NEW: &str = "getOrdersNew";
}

/// Streaming topics, appended to the pair to form a channel name.
pub mod topics {
    pub const TICKER: &str = "ticker";
    pub const DEPTH: &str = "depth";
    pub const TRADES: &str = "trades";
}
