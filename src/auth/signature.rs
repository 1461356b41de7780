//! Request signing for trade API calls.
//!
//! A signed request carries two extra query parameters, computed as:
//!
//! ```text
//! request_key = hex(SHA1(secret_key))
//! canonical   = "k1=v1&k2=v2&..."          (keys sorted byte-wise, values unescaped)
//! signature   = hex(HMAC-MD5(canonical, request_key))
//! timestamp   = now, in milliseconds
//! ```
//!
//! The signature covers only the parameters present before signing; the
//! signature and timestamp keys themselves never enter the canonical string.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::{Digest, Sha1};

use crate::auth::{SystemClock, TimestampProvider};
use crate::types::QueryParams;

type HmacMd5 = Hmac<Md5>;

/// Default parameter name for the signature.
pub const SIGNATURE_KEY: &str = "signature";
/// Default parameter name for the request timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Derive the MAC key from a secret: the lowercase hex SHA-1 of the secret.
pub fn derive_request_key(secret_key: &str) -> String {
    hex::encode(Sha1::digest(secret_key.as_bytes()))
}

/// Serialize parameters as `key=value` pairs joined with `&`, in ascending
/// key order, skipping the `excluded` keys.
pub fn canonical_query_string(params: &QueryParams, excluded: &[&str]) -> String {
    params
        .iter()
        .filter(|(key, _)| !excluded.contains(key))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex HMAC-MD5 of `canonical`, keyed by `request_key`.
pub fn compute_signature(request_key: &str, canonical: &str) -> String {
    let mut mac =
        HmacMd5::new_from_slice(request_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signs query parameters for an exchange's trade API.
///
/// The parameter names used for the signature and the timestamp differ
/// between exchanges, so they are configurable.
///
/// # Example
///
/// ```rust
/// use coinx::auth::Signer;
/// use coinx::types::QueryParams;
///
/// let signer = Signer::new();
/// let mut params = QueryParams::new().with("method", "order").with("price", 100);
/// signer.sign(&mut params, "s3cr3t");
///
/// assert!(params.contains_key("signature"));
/// assert!(params.contains_key("timestamp"));
/// ```
#[derive(Clone)]
pub struct Signer {
    signature_key: &'static str,
    timestamp_key: &'static str,
    timestamps: Arc<dyn TimestampProvider>,
}

impl Signer {
    /// Create a signer writing `signature` and `timestamp`, timestamped by
    /// the wall clock.
    pub fn new() -> Self {
        Self::with_keys(SIGNATURE_KEY, TIMESTAMP_KEY)
    }

    /// Create a signer writing custom parameter names.
    pub fn with_keys(signature_key: &'static str, timestamp_key: &'static str) -> Self {
        Self {
            signature_key,
            timestamp_key,
            timestamps: Arc::new(SystemClock),
        }
    }

    /// Use a custom timestamp provider.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamps = provider;
        self
    }

    /// Parameter name the signature is stored under.
    pub fn signature_key(&self) -> &'static str {
        self.signature_key
    }

    /// Parameter name the timestamp is stored under.
    pub fn timestamp_key(&self) -> &'static str {
        self.timestamp_key
    }

    /// The canonical string the signature of `params` covers.
    pub fn canonical(&self, params: &QueryParams) -> String {
        canonical_query_string(params, &[self.signature_key, self.timestamp_key])
    }

    /// Sign `params` in place, adding the signature and a fresh timestamp.
    ///
    /// Signing the same set twice yields the same signature but a new
    /// timestamp.
    pub fn sign(&self, params: &mut QueryParams, secret_key: &str) {
        let canonical = self.canonical(params);
        let signature = compute_signature(&derive_request_key(secret_key), &canonical);
        params.insert(self.signature_key, signature);
        params.insert(self.timestamp_key, self.timestamps.now_millis());
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("signature_key", &self.signature_key)
            .field("timestamp_key", &self.timestamp_key)
            .finish()
    }
}

/// Sign `params` with the default parameter names and clock.
pub fn sign_params(params: &mut QueryParams, secret_key: &str) {
    Signer::new().sign(params, secret_key);
}
