//! Authentication for trade API calls.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Millisecond request timestamps
//! - SHA1-derived HMAC-MD5 request signing over canonical query strings

mod credentials;
mod signature;
mod timestamp;

pub use credentials::{
    ACCESS_KEY_VAR, Credentials, CredentialsProvider, EnvCredentials, SECRET_KEY_VAR,
    StaticCredentials,
};
pub use signature::{
    SIGNATURE_KEY, Signer, TIMESTAMP_KEY, canonical_query_string, compute_signature,
    derive_request_key, sign_params,
};
pub use timestamp::{IncreasingTimestamp, SystemClock, TimestampProvider, current_time_millis};
