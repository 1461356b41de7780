//! Canonical data model shared by every exchange integration.

pub mod account;
pub mod common;
pub mod market;
pub mod query;
pub mod serde_helpers;

pub use account::{Account, Asset, Coin, Order};
pub use common::*;
pub use market::{Depth, DepthEntry, Kline, SymbolConfig, Ticker, Trade};
pub use query::{ParamValue, QueryParams};
