//! Exchange integrations.
//!
//! Each exchange module decodes its own wire formats into the canonical
//! types in [`crate::types`] and describes its error payloads with a
//! [`crate::classify::ErrorClassifier`] built once per client.

pub mod huobi;
mod traits;
pub mod zb;

pub use traits::MarketDataClient;
