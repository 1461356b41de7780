//! ZB trade keys and where they come from.

use secrecy::{ExposeSecret, SecretString};

pub const ACCESS_KEY_VAR: &str = "ZB_ACCESS_KEY";
pub const SECRET_KEY_VAR: &str = "ZB_SECRET_KEY";

/// A ZB key pair.
///
/// `access_key` travels in every signed request as the `accesskey`
/// parameter. The secret key never leaves the process: it is only hashed
/// into the signing key, and `Debug` prints it as `[REDACTED]`.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    secret_key: SecretString,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecretString::from(secret_key.into()),
        }
    }

    /// Raw secret key, for the signer.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Source of the key pair used by the trade client.
///
/// Looked up once per signed request, so an implementation backed by a
/// vault may rotate keys between calls.
pub trait CredentialsProvider: Send + Sync {
    fn get_credentials(&self) -> &Credentials;
}

/// Keys fixed at construction.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(access_key, secret_key),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Keys read from the process environment when constructed.
#[derive(Debug)]
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Read [`ACCESS_KEY_VAR`] and [`SECRET_KEY_VAR`].
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars(ACCESS_KEY_VAR, SECRET_KEY_VAR)
    }

    /// Read the pair from the named variables.
    ///
    /// `None` unless both are set to something other than whitespace;
    /// ZB answers a blank key with an authentication error anyway.
    pub fn try_from_env_vars(access_var: &str, secret_var: &str) -> Option<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Some(Self {
            credentials: Credentials::new(read(access_var)?, read(secret_var)?),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
