//! Huobi error reporting: `{"status":"error","err-code":"...","err-msg":"..."}`.

use crate::classify::{ErrorClassifier, ErrorMapping, ResponseShape};
use crate::error::ErrorCode;

/// Response shape of the Huobi API.
pub const SHAPE: ResponseShape = ResponseShape::status("status", "ok", "err-code", "err-msg");

/// Huobi's textual codes on the unified taxonomy.
pub fn error_mapping() -> ErrorMapping {
    ErrorMapping::builder()
        .codes(
            ["bad-request", "bad-argument", "invalid-parameter"],
            ErrorCode::InvalidArgument,
        )
        .codes(
            [
                "login-required",
                "api-signature-not-valid",
                "api-signature-check-failed",
            ],
            ErrorCode::AuthenticationFailed,
        )
        .codes(
            [
                "account-balance-insufficient-error",
                "account-frozen-balance-insufficient-error",
            ],
            ErrorCode::InsufficientFund,
        )
        .code("order-orderprice-precision-error", ErrorCode::InvalidPrice)
        .code("order-orderamount-precision-error", ErrorCode::InvalidAmount)
        .code("base-record-invalid", ErrorCode::OrderNotFound)
        .code("base-system-error", ErrorCode::InternalError)
        .code("system-maintenance", ErrorCode::Maintained)
        .code("system-busy", ErrorCode::Unavailable)
        .build()
}

/// Classifier for Huobi responses.
pub fn classifier() -> ErrorClassifier {
    ErrorClassifier::new(SHAPE, error_mapping())
}
