//! # coinx
//!
//! An async client layer unifying cryptocurrency exchange REST and WebSocket
//! APIs behind one vocabulary of tickers, klines, trades, depth, orders and
//! accounts.
//!
//! ## Features
//!
//! - Deterministic request signing for trade APIs ([`auth`])
//! - One error taxonomy for every exchange ([`ErrorCode`], [`ApiError`], [`classify`])
//! - Many channel subscriptions over one streaming connection ([`ws::Multiplexer`])
//! - ZB (market data, trading, streams) and Huobi (market data) integrations
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coinx::exchanges::zb::ZbRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ZbRestClient::new();
//!     let depth = client.get_depth(&"btc_usdt".parse()?, 10).await?;
//!     println!("best bid: {:?}", depth.best_bid());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod classify;
pub mod error;
pub mod exchanges;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::{ApiError, CoinxError, ErrorCode};
pub use types::common::{CurrencyPair, OrderStatus, TradeType};

/// Result type alias using CoinxError
pub type Result<T> = std::result::Result<T, CoinxError>;
