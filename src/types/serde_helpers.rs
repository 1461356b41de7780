//! Lenient serde helpers for exchange payloads.
//!
//! Exchanges send numbers as JSON numbers in one endpoint and as strings in
//! the next, and drop fields freely. These helpers accept either form and
//! substitute zero (or empty) for anything missing or unparseable, so one
//! bad field never fails a whole payload.
//!
//! Use them together with `#[serde(default)]` so absent fields are covered
//! too.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a decimal from a JSON string or number.
///
/// Accepts plain (`"9000.5"`, `3840.46`) and scientific (`1e-7`) notation.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// Parse an unsigned integer from a JSON string or number.
///
/// Fractional values are truncated.
pub fn u64_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|x| *x >= 0.0).map(|x| x as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                parse_decimal(s)
                    .filter(|d| d.is_sign_positive())
                    .and_then(|d| d.trunc().to_u64())
            })
        }
        _ => None,
    }
}

/// Parse a signed integer from a JSON string or number.
pub fn i64_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|x| x as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Decimal from a string or number, zero when missing or invalid.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use rust_decimal::Decimal;
/// use coinx::types::serde_helpers::lenient_decimal;
///
/// #[derive(Deserialize)]
/// struct Ticker {
///     #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
///     last: Decimal,
/// }
///
/// let ticker: Ticker = serde_json::from_str(r#"{"last":"9000.5"}"#).unwrap();
/// assert_eq!(ticker.last, Decimal::new(90005, 1));
///
/// let ticker: Ticker = serde_json::from_str(r#"{"last":"n/a"}"#).unwrap();
/// assert!(ticker.last.is_zero());
/// ```
pub mod lenient_decimal {
    use super::*;

    /// Deserialize a decimal, substituting zero.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value).unwrap_or(Decimal::ZERO))
    }
}

/// Unsigned integer from a string or number, zero when missing or invalid.
pub mod lenient_u64 {
    use super::*;

    /// Deserialize an unsigned integer, substituting zero.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(u64_from_value(&value).unwrap_or(0))
    }
}

/// Small unsigned integer (scales, precisions), zero when missing, invalid
/// or out of range.
pub mod lenient_u8 {
    use super::*;

    /// Deserialize a `u8`, substituting zero.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(u64_from_value(&value)
            .and_then(|n| u8::try_from(n).ok())
            .unwrap_or(0))
    }
}

/// Signed integer from a string or number, zero when missing or invalid.
pub mod lenient_i64 {
    use super::*;

    /// Deserialize a signed integer, substituting zero.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(i64_from_value(&value).unwrap_or(0))
    }
}

/// String from a string or number, empty when missing or of another type.
pub mod lenient_string {
    use super::*;

    /// Deserialize a string, substituting the empty string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }
}

/// Boolean from `true`/`false` or their string forms, false otherwise.
pub mod lenient_bool {
    use super::*;

    /// Deserialize a boolean, substituting `false`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_decimal::deserialize")]
        price: Decimal,
        #[serde(default, deserialize_with = "lenient_u64::deserialize")]
        time: u64,
        #[serde(default, deserialize_with = "lenient_u8::deserialize")]
        scale: u8,
        #[serde(default, deserialize_with = "lenient_i64::deserialize")]
        status: i64,
        #[serde(default, deserialize_with = "lenient_string::deserialize")]
        id: String,
        #[serde(default, deserialize_with = "lenient_bool::deserialize")]
        enabled: bool,
    }

    #[test]
    fn test_string_encoded_numbers() {
        let sample: Sample = serde_json::from_str(
            r#"{"price":"3826.94","time":"1472800466093","scale":"8","status":"3","id":20180122,"enabled":"true"}"#,
        )
        .unwrap();
        assert_eq!(sample.price, Decimal::from_str("3826.94").unwrap());
        assert_eq!(sample.time, 1_472_800_466_093);
        assert_eq!(sample.scale, 8);
        assert_eq!(sample.status, 3);
        assert_eq!(sample.id, "20180122");
        assert!(sample.enabled);
    }

    #[test]
    fn test_json_numbers() {
        let sample: Sample =
            serde_json::from_str(r#"{"price":3840.46,"time":1472107500000,"scale":2}"#).unwrap();
        assert_eq!(sample.price, Decimal::from_str("3840.46").unwrap());
        assert_eq!(sample.time, 1_472_107_500_000);
        assert_eq!(sample.scale, 2);
    }

    #[test]
    fn test_missing_and_invalid_fields_become_zero() {
        let sample: Sample =
            serde_json::from_str(r#"{"price":"abc","time":null,"scale":300,"enabled":{}}"#)
                .unwrap();
        assert!(sample.price.is_zero());
        assert_eq!(sample.time, 0);
        assert_eq!(sample.scale, 0);
        assert_eq!(sample.status, 0);
        assert_eq!(sample.id, "");
        assert!(!sample.enabled);
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(
            decimal_from_value(&json!("1e-7")),
            Some(Decimal::from_str("0.0000001").unwrap())
        );
    }

    #[test]
    fn test_u64_from_fractional_string() {
        assert_eq!(u64_from_value(&json!("12.9")), Some(12));
        assert_eq!(u64_from_value(&json!("-1")), None);
    }
}
