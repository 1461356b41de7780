//! Error types for the coinx client library.

use thiserror::Error;

/// The main error type for all client operations.
///
/// Whatever the variant, every error can be viewed through the unified
/// `{code, message}` surface with [`CoinxError::code`],
/// [`CoinxError::message`] and [`CoinxError::to_api_error`].
#[derive(Error, Debug)]
pub enum CoinxError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The exchange reported an error, already mapped onto the unified taxonomy
    #[error("Exchange API error: {0}")]
    Api(ApiError),

    /// Opening the streaming connection failed
    #[error("Failed to connect to {url}: {reason}")]
    Connection {
        /// Endpoint that was dialed
        url: String,
        /// Why the handshake failed
        reason: String,
    },

    /// Streaming connection closed unexpectedly
    #[error("WebSocket connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the closure
        reason: String,
    },

    /// An operation that needs a live streaming connection was called without one
    #[error("Not connected")]
    NotConnected,

    /// A caller-supplied argument could not be used
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Missing required credentials
    #[error("Missing credentials: access key and secret key required for trade endpoints")]
    MissingCredentials,
}

impl CoinxError {
    /// The unified error code for this error.
    ///
    /// Exchange errors keep the code they were classified with. Transport
    /// failures report [`ErrorCode::Unavailable`], malformed payloads
    /// [`ErrorCode::InternalError`] and caller mistakes
    /// [`ErrorCode::InvalidArgument`].
    pub fn code(&self) -> ErrorCode {
        match self {
            CoinxError::Api(e) => e.code(),
            CoinxError::Http(_)
            | CoinxError::HttpMiddleware(_)
            | CoinxError::WebSocket(_)
            | CoinxError::Connection { .. }
            | CoinxError::ConnectionClosed { .. }
            | CoinxError::Timeout => ErrorCode::Unavailable,
            CoinxError::Json(_) | CoinxError::InvalidResponse(_) => ErrorCode::InternalError,
            CoinxError::Url(_) | CoinxError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            CoinxError::NotConnected => ErrorCode::GeneralError,
            CoinxError::MissingCredentials => ErrorCode::AuthenticationFailed,
        }
    }

    /// Human-readable message for this error.
    pub fn message(&self) -> String {
        match self {
            CoinxError::Api(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Collapse this error into the unified `{code, message}` value.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            CoinxError::Api(e) => e.clone(),
            other => ApiError::new(other.code(), other.message()),
        }
    }

    /// Check if this is an exchange error with the given unified code.
    pub fn is_api_code(&self, code: ErrorCode) -> bool {
        matches!(self, CoinxError::Api(e) if e.code() == code)
    }
}

impl From<ApiError> for CoinxError {
    fn from(error: ApiError) -> Self {
        CoinxError::Api(error)
    }
}

/// Unified error codes every exchange-native error is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    GeneralError,
    InternalError,
    AuthenticationFailed,
    FundPasswordLocked,
    IncorrectFundPassword,
    AuthenticationAuditing,
    EmptyChannel,
    EmptyEvent,
    Maintained,
    InsufficientFund,
    OrderNotFound,
    InvalidPrice,
    InvalidAmount,
    UserNotFound,
    InvalidArgument,
    InvalidIpAddress,
    RequestTimeExpired,
    TradeRecordNotFound,
    Unavailable,
    TooFrequent,
    /// Fallback for native codes missing from an exchange's mapping table.
    Unknown,
}

impl ErrorCode {
    /// Stable identifier for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::GeneralError => "general_error",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::FundPasswordLocked => "fund_password_locked",
            ErrorCode::IncorrectFundPassword => "incorrect_fund_password",
            ErrorCode::AuthenticationAuditing => "authentication_auditing",
            ErrorCode::EmptyChannel => "empty_channel",
            ErrorCode::EmptyEvent => "empty_event",
            ErrorCode::Maintained => "maintained",
            ErrorCode::InsufficientFund => "insufficient_fund",
            ErrorCode::OrderNotFound => "order_not_found",
            ErrorCode::InvalidPrice => "invalid_price",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::UserNotFound => "user_not_found",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::InvalidIpAddress => "invalid_ip_address",
            ErrorCode::RequestTimeExpired => "request_time_expired",
            ErrorCode::TradeRecordNotFound => "trade_record_not_found",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::TooFrequent => "too_frequent",
            ErrorCode::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified exchange error: a code from the closed taxonomy plus the
/// exchange's own message.
///
/// Values are produced by the classification layer in [`crate::classify`];
/// callers only read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The unified error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The message reported by the exchange (may be empty).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == ErrorCode::TooFrequent
    }

    /// Check if the credentials or request signature were rejected.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::AuthenticationFailed | ErrorCode::AuthenticationAuditing
        )
    }

    /// Check if this is a service unavailable error.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self.code, ErrorCode::Unavailable | ErrorCode::Maintained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let error = ApiError::new(ErrorCode::InsufficientFund, "not enough btc");
        assert_eq!(error.to_string(), "insufficient_fund: not enough btc");
    }

    #[test]
    fn test_api_error_predicates() {
        assert!(ApiError::new(ErrorCode::TooFrequent, "").is_rate_limit());
        assert!(ApiError::new(ErrorCode::AuthenticationFailed, "").is_authentication());
        assert!(ApiError::new(ErrorCode::Maintained, "").is_service_unavailable());
        assert!(!ApiError::new(ErrorCode::OrderNotFound, "").is_rate_limit());
    }

    #[test]
    fn test_transport_errors_have_unified_surface() {
        let error = CoinxError::ConnectionClosed {
            reason: "eof".to_string(),
        };
        let unified = error.to_api_error();
        assert_eq!(unified.code(), ErrorCode::Unavailable);
        assert!(unified.message().contains("eof"));
    }

    #[test]
    fn test_api_variant_keeps_its_code() {
        let error = CoinxError::from(ApiError::new(ErrorCode::InvalidPrice, "bad price"));
        assert_eq!(error.code(), ErrorCode::InvalidPrice);
        assert_eq!(error.message(), "bad price");
        assert!(error.is_api_code(ErrorCode::InvalidPrice));
        assert_eq!(
            error.to_api_error(),
            ApiError::new(ErrorCode::InvalidPrice, "bad price")
        );
    }

    #[test]
    fn test_contract_violations_map_to_codes() {
        assert_eq!(CoinxError::NotConnected.code(), ErrorCode::GeneralError);
        assert_eq!(
            CoinxError::MissingCredentials.code(),
            ErrorCode::AuthenticationFailed
        );
        assert_eq!(
            CoinxError::InvalidArgument("pair".into()).code(),
            ErrorCode::InvalidArgument
        );
    }
}
