//! Classification of raw exchange responses onto the unified error taxonomy.
//!
//! Exchanges report failures in different ways. Each integration describes
//! its responses once, at construction time, with a [`ResponseShape`] and an
//! [`ErrorMapping`] from its native error identifiers to [`ErrorCode`]s:
//!
//! ```text
//! Status shape:      {"status":"ok", ...}
//!                    {"status":"error","err-code":"bad-argument","err-msg":"..."}
//! Error-field shape: {...}                       (no error field: success)
//!                    {"code":3001,"message":"..."}
//! ```
//!
//! Classification is total: any byte sequence yields either success or an
//! [`ApiError`], never a panic.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ApiError, ErrorCode};

/// An exchange-native error identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeCode {
    /// Numeric error code (e.g. ZB's `3001`).
    Numeric(i64),
    /// String error code (e.g. Huobi's `"bad-argument"`).
    Text(String),
}

impl NativeCode {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(
                n.as_i64()
                    .map(NativeCode::Numeric)
                    .unwrap_or_else(|| NativeCode::Text(n.to_string())),
            ),
            Value::String(s) => Some(NativeCode::Text(s.clone())),
            Value::Bool(b) => Some(NativeCode::Text(b.to_string())),
            _ => None,
        }
    }

    /// The same identifier in the other representation, if it has one.
    fn alternate(&self) -> Option<NativeCode> {
        match self {
            NativeCode::Numeric(n) => Some(NativeCode::Text(n.to_string())),
            NativeCode::Text(s) => s.trim().parse().ok().map(NativeCode::Numeric),
        }
    }
}

impl From<i64> for NativeCode {
    fn from(code: i64) -> Self {
        NativeCode::Numeric(code)
    }
}

impl From<i32> for NativeCode {
    fn from(code: i32) -> Self {
        NativeCode::Numeric(code.into())
    }
}

impl From<&str> for NativeCode {
    fn from(code: &str) -> Self {
        NativeCode::Text(code.to_string())
    }
}

impl From<String> for NativeCode {
    fn from(code: String) -> Self {
        NativeCode::Text(code)
    }
}

impl std::fmt::Display for NativeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeCode::Numeric(n) => write!(f, "{n}"),
            NativeCode::Text(s) => f.write_str(s),
        }
    }
}

/// Immutable table from one exchange's native error codes to unified codes.
///
/// Cloning is cheap; all clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ErrorMapping {
    codes: Arc<HashMap<NativeCode, ErrorCode>>,
}

impl ErrorMapping {
    /// Create a new mapping builder.
    pub fn builder() -> ErrorMappingBuilder {
        ErrorMappingBuilder::default()
    }

    /// Look up a native code. Numeric codes sent as strings match numeric
    /// entries and vice versa.
    pub fn lookup(&self, native: &NativeCode) -> Option<ErrorCode> {
        self.codes.get(native).copied().or_else(|| {
            native
                .alternate()
                .and_then(|alt| self.codes.get(&alt).copied())
        })
    }

    /// Map a native code, falling back to [`ErrorCode::Unknown`].
    pub fn resolve(&self, native: &NativeCode) -> ErrorCode {
        self.lookup(native).unwrap_or(ErrorCode::Unknown)
    }

    /// Number of native codes in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<K: Into<NativeCode>> FromIterator<(K, ErrorCode)> for ErrorMapping {
    fn from_iter<I: IntoIterator<Item = (K, ErrorCode)>>(iter: I) -> Self {
        Self {
            codes: Arc::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

/// Builder for [`ErrorMapping`].
#[derive(Debug, Clone, Default)]
pub struct ErrorMappingBuilder {
    codes: HashMap<NativeCode, ErrorCode>,
}

impl ErrorMappingBuilder {
    /// Map one native code.
    pub fn code(mut self, native: impl Into<NativeCode>, code: ErrorCode) -> Self {
        self.codes.insert(native.into(), code);
        self
    }

    /// Map several native codes onto the same unified code.
    pub fn codes<I, K>(mut self, natives: I, code: ErrorCode) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<NativeCode>,
    {
        for native in natives {
            self.codes.insert(native.into(), code);
        }
        self
    }

    /// Freeze the table.
    pub fn build(self) -> ErrorMapping {
        ErrorMapping {
            codes: Arc::new(self.codes),
        }
    }
}

/// How an exchange signals failure in its response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// A sentinel field carries an explicit success marker; anything else is
    /// a failure described by separate code and message fields.
    Status {
        /// Field holding the sentinel (e.g. `status`).
        status_field: &'static str,
        /// Sentinel value meaning success (e.g. `ok`).
        success_value: &'static str,
        /// Field holding the native error code.
        code_field: &'static str,
        /// Field holding the error message.
        message_field: &'static str,
    },
    /// The presence of a designated field signals failure; its absence means
    /// success. A native code that maps to [`ErrorCode::Ok`] is also success.
    ErrorField {
        /// Field whose presence signals failure.
        field: &'static str,
        /// Field holding the native error code, if the exchange sends one.
        code_field: Option<&'static str>,
        /// Field holding the error message.
        message_field: &'static str,
    },
}

impl ResponseShape {
    /// Status/message shape.
    pub const fn status(
        status_field: &'static str,
        success_value: &'static str,
        code_field: &'static str,
        message_field: &'static str,
    ) -> Self {
        ResponseShape::Status {
            status_field,
            success_value,
            code_field,
            message_field,
        }
    }

    /// Error-field shape where the field itself carries the message and no
    /// code is sent.
    pub const fn error_message(field: &'static str) -> Self {
        ResponseShape::ErrorField {
            field,
            code_field: None,
            message_field: field,
        }
    }

    /// Error-field shape where the presence of a code field signals a
    /// possible failure.
    pub const fn error_code(code_field: &'static str, message_field: &'static str) -> Self {
        ResponseShape::ErrorField {
            field: code_field,
            code_field: Some(code_field),
            message_field,
        }
    }
}

/// Classify a raw response body.
///
/// Returns `Ok(())` when the body carries no error indicator for `shape`.
/// Otherwise the native code is mapped through `mapping`: unmapped codes
/// become [`ErrorCode::Unknown`], a failure without any code becomes
/// [`ErrorCode::GeneralError`]. A body that is not JSON yields
/// [`ErrorCode::Unknown`] with the body text as the message.
pub fn classify(body: &[u8], shape: &ResponseShape, mapping: &ErrorMapping) -> Result<(), ApiError> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => {
            return Err(ApiError::new(
                ErrorCode::Unknown,
                String::from_utf8_lossy(body).trim(),
            ));
        }
    };

    match shape {
        ResponseShape::Status {
            status_field,
            success_value,
            code_field,
            message_field,
        } => {
            let succeeded = value
                .get(*status_field)
                .and_then(Value::as_str)
                .is_some_and(|status| status == *success_value);
            if succeeded {
                return Ok(());
            }
            let native = value.get(*code_field).and_then(NativeCode::from_json);
            Err(failure(native, text_field(&value, message_field), mapping))
        }
        ResponseShape::ErrorField {
            field,
            code_field,
            message_field,
        } => {
            if value.get(*field).is_none_or(Value::is_null) {
                return Ok(());
            }
            let native = code_field
                .and_then(|f| value.get(f))
                .and_then(NativeCode::from_json);
            if let Some(native) = &native {
                if mapping.lookup(native) == Some(ErrorCode::Ok) {
                    return Ok(());
                }
            }
            Err(failure(native, text_field(&value, message_field), mapping))
        }
    }
}

fn failure(native: Option<NativeCode>, message: String, mapping: &ErrorMapping) -> ApiError {
    let code = match native {
        Some(native) => match mapping.resolve(&native) {
            // A failure indicator with a success code is still a failure.
            ErrorCode::Ok => ErrorCode::GeneralError,
            code => code,
        },
        None => ErrorCode::GeneralError,
    };
    ApiError::new(code, message)
}

fn text_field(value: &Value, field: &str) -> String {
    match value.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// A response shape and code table resolved for one exchange API.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    shape: ResponseShape,
    mapping: ErrorMapping,
}

impl ErrorClassifier {
    /// Create a classifier.
    pub fn new(shape: ResponseShape, mapping: ErrorMapping) -> Self {
        Self { shape, mapping }
    }

    /// Classify a raw response body. See [`classify`].
    pub fn classify(&self, body: &[u8]) -> Result<(), ApiError> {
        classify(body, &self.shape, &self.mapping)
    }

    /// The response shape.
    pub fn shape(&self) -> &ResponseShape {
        &self.shape
    }

    /// The native code table.
    pub fn mapping(&self) -> &ErrorMapping {
        &self.mapping
    }
}
