//! Huobi exchange integration (market data).

pub mod codes;
pub mod decode;
mod rest;

pub use rest::{BASE_URL, HuobiRestClient, HuobiRestClientBuilder, endpoints, symbol};
