//! Streaming subscriptions over a single persistent connection.
//!
//! A [`Multiplexer`] owns one connection, a [`ChannelRegistry`] of
//! per-channel decode/dispatch pipelines and the one task that reads frames
//! and routes them. Exchange conventions (channel naming, subscription
//! requests, frame tagging) come from a [`StreamProtocol`].
//!
//! # Example
//!
//! ```rust,no_run
//! use coinx::exchanges::zb::ZbStreamClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), coinx::CoinxError> {
//!     let client = ZbStreamClient::new();
//!     client.connect().await?;
//!
//!     client
//!         .subscribe_ticker(&"btc_usdt".parse()?, |ticker| {
//!             println!("last: {}", ticker.last);
//!         })
//!         .await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

mod config;
mod multiplexer;
mod protocol;
mod registry;
mod transport;

pub use config::{WsConfig, WsConfigBuilder};
pub use multiplexer::{ConnectionState, Multiplexer};
pub use protocol::{ControlFrame, RawProtocol, StreamProtocol};
pub use registry::{ChannelRegistration, ChannelRegistry};
pub use transport::{
    Connection, Connector, Frame, FrameSink, FrameStream, TungsteniteConnector,
};
