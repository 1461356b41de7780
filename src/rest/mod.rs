//! REST transport.
//!
//! Exchange clients in [`crate::exchanges`] build their query parameters,
//! sign them when needed, and hand them to [`HttpClient::get`], which returns
//! the raw body for classification and decoding.

mod client;

pub use client::{HttpClient, HttpClientBuilder, endpoint_url};
