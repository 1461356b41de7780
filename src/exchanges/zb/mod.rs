//! ZB exchange integration.
//!
//! - [`ZbRestClient`]: market data and signed trade endpoints
//! - [`ZbStreamClient`]: ticker, depth and trade streams over one connection
//!
//! Trade requests are signed with the `sign` / `reqTime` parameter names and
//! errors are mapped through ZB's numeric code table ([`codes`]).

pub mod codes;
pub mod decode;
pub mod endpoints;
mod rest;
mod ws;

pub use rest::{ZbRestClient, ZbRestClientBuilder};
pub use ws::{ZbProtocol, ZbStreamClient, channel_name};
