//! HTTP transport shared by the exchange REST clients.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use tracing::{debug, warn};
use url::Url;

use crate::error::CoinxError;
use crate::types::QueryParams;

/// Join a base URL and an endpoint path with exactly one `/`.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// A thin GET-only HTTP client returning raw response bodies.
///
/// Bodies are returned whatever the HTTP status, since exchanges report
/// errors in the payload; interpreting them is left to the caller's
/// classifier. Requests are traced; transient failures are retried only when
/// [`HttpClientBuilder::max_retries`] is set.
#[derive(Clone)]
pub struct HttpClient {
    client: ClientWithMiddleware,
}

impl HttpClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Issue a GET for `url` with `params` as the query string and return the
    /// raw body.
    pub async fn get(&self, url: &str, params: QueryParams) -> Result<Vec<u8>, CoinxError> {
        let mut url = Url::parse(url)?;
        if !params.is_empty() {
            url.set_query(Some(&params.to_query_string()?));
        }

        debug!(path = url.path(), "GET");
        let response = self.client.get(url).send().await.map_err(|e| match e {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => CoinxError::Timeout,
            other => CoinxError::HttpMiddleware(other),
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                CoinxError::Timeout
            } else {
                CoinxError::Http(e)
            }
        })?;

        if !status.is_success() {
            warn!(%status, len = body.len(), "Non-success HTTP status");
            if body.is_empty() {
                return Err(CoinxError::InvalidResponse(format!("HTTP {status}")));
            }
        }

        Ok(body.to_vec())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    max_retries: u32,
}

impl HttpClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set a per-request timeout. Off by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum number of retries for transient failures. `0`, the
    /// default, disables retrying.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> HttpClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("coinx/{}", env!("CARGO_PKG_VERSION")));
        let header_value =
            HeaderValue::from_str(&user_agent).unwrap_or_else(|_| HeaderValue::from_static("coinx"));
        headers.insert(USER_AGENT, header_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let reqwest_client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        let mut client = ClientBuilder::new(reqwest_client).with(TracingMiddleware::default());
        if self.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
            client = client.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        HttpClient {
            client: client.build(),
        }
    }
}
