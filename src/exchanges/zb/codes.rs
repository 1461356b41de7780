//! ZB error reporting.
//!
//! The data API answers `{"error":"<message>"}` and sends no code. The trade
//! API always answers with `code`/`message`, where `1000` means success.

use crate::classify::{ErrorClassifier, ErrorMapping, ResponseShape};
use crate::error::ErrorCode;

/// Response shape of the market data API.
pub const DATA_API_SHAPE: ResponseShape = ResponseShape::error_message("error");

/// Response shape of the trade API.
pub const TRADE_API_SHAPE: ResponseShape = ResponseShape::error_code("code", "message");

/// ZB's numeric codes on the unified taxonomy.
pub fn error_mapping() -> ErrorMapping {
    ErrorMapping::builder()
        .code(1000, ErrorCode::Ok)
        .code(1001, ErrorCode::GeneralError)
        .code(1002, ErrorCode::InternalError)
        .code(1003, ErrorCode::AuthenticationFailed)
        .code(1004, ErrorCode::FundPasswordLocked)
        .code(1005, ErrorCode::IncorrectFundPassword)
        .code(1006, ErrorCode::AuthenticationAuditing)
        .code(1007, ErrorCode::EmptyChannel)
        .code(1008, ErrorCode::EmptyEvent)
        .code(1009, ErrorCode::Maintained)
        .codes(
            [2001, 2002, 2003, 2005, 2006, 2007, 2008, 2009],
            ErrorCode::InsufficientFund,
        )
        .code(3001, ErrorCode::OrderNotFound)
        .code(3002, ErrorCode::InvalidPrice)
        .code(3003, ErrorCode::InvalidAmount)
        .code(3004, ErrorCode::UserNotFound)
        .code(3005, ErrorCode::InvalidArgument)
        .code(3006, ErrorCode::InvalidIpAddress)
        .code(3007, ErrorCode::RequestTimeExpired)
        .code(3008, ErrorCode::TradeRecordNotFound)
        .code(4001, ErrorCode::Unavailable)
        .code(4002, ErrorCode::TooFrequent)
        .build()
}

/// Classifier for market data responses.
pub fn data_api_classifier() -> ErrorClassifier {
    ErrorClassifier::new(DATA_API_SHAPE, error_mapping())
}

/// Classifier for trade responses.
pub fn trade_api_classifier() -> ErrorClassifier {
    ErrorClassifier::new(TRADE_API_SHAPE, error_mapping())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_success_code() {
        let classifier = trade_api_classifier();
        assert!(classifier.classify(br#"{"code":1000,"message":"success","id":"1"}"#).is_ok());
        assert!(classifier.classify(br#"[{"id":"1"}]"#).is_ok());
    }

    #[test]
    fn test_trade_error_codes() {
        let classifier = trade_api_classifier();

        let err = classifier
            .classify(br#"{"code":2009,"message":"insufficient"}"#)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientFund);
        assert_eq!(err.message(), "insufficient");

        let err = classifier.classify(br#"{"code":"3001"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
        assert_eq!(err.message(), "");

        let err = classifier.classify(br#"{"code":2004,"message":"?"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);
    }

    #[test]
    fn test_data_error_has_no_code() {
        let err = data_api_classifier()
            .classify(br#"{"error":"market not found"}"#)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::GeneralError);
        assert_eq!(err.message(), "market not found");
    }

    #[test]
    fn test_mapping_size() {
        assert_eq!(error_mapping().len(), 28);
    }
}
