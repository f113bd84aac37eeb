//! Best-effort encoding of input that comes without a type descriptor.

use crate::encode::{parse_principal, strip_wrapper, EncodeError};
use crate::value::{is_valid_field_name, ClarityValue};
use serde_json::Value;

fn infer_str(s: &str) -> Result<ClarityValue, EncodeError> {
    let s = s.trim();
    match s {
        "true" => return Ok(ClarityValue::Bool(true)),
        "false" => return Ok(ClarityValue::Bool(false)),
        "none" => return Ok(ClarityValue::OptionalNone),
        _ => {}
    }

    if let Some(inner) = strip_wrapper(s, "some") {
        return Ok(ClarityValue::some(infer_str(inner)?));
    }
    if let Some(inner) = strip_wrapper(s, "ok") {
        return Ok(ClarityValue::ok(infer_str(inner)?));
    }
    if let Some(inner) = strip_wrapper(s, "err") {
        return Ok(ClarityValue::err(infer_str(inner)?));
    }

    if let Some(digits) = s.strip_prefix('u') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .parse::<u128>()
                .map(ClarityValue::UInt)
                .map_err(|_| EncodeError::OutOfRange {
                    ty: "uint".to_string(),
                    input: s.to_string(),
                });
        }
    }

    let unsigned = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i128>()
            .map(ClarityValue::Int)
            .map_err(|_| EncodeError::OutOfRange {
                ty: "int".to_string(),
                input: s.to_string(),
            });
    }

    if let Some(digits) = s.strip_prefix("0x") {
        return hex::decode(digits)
            .map(ClarityValue::Buffer)
            .map_err(|e| EncodeError::InvalidHex(e.to_string()));
    }

    if s.starts_with('S') {
        if let Ok(principal) = parse_principal(s) {
            return Ok(principal);
        }
    }

    if s.is_ascii() {
        Ok(ClarityValue::StringAscii(s.to_string()))
    } else {
        Ok(ClarityValue::StringUtf8(s.to_string()))
    }
}

fn infer_json(value: &Value) -> Result<ClarityValue, EncodeError> {
    match value {
        Value::Null => Ok(ClarityValue::OptionalNone),
        Value::Bool(b) => Ok(ClarityValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(|i| ClarityValue::Int(i as i128))
            .or_else(|| n.as_u64().map(|u| ClarityValue::Int(u as i128)))
            .ok_or_else(|| EncodeError::InvalidLiteral {
                ty: "int".to_string(),
                input: n.to_string(),
            }),
        Value::String(s) => infer_str(s),
        Value::Array(items) => items
            .iter()
            .map(infer_json)
            .collect::<Result<Vec<_>, _>>()
            .map(ClarityValue::List),
        // serde_json maps iterate in key order.
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                if !is_valid_field_name(k) {
                    return Err(EncodeError::InvalidName(k.clone()));
                }
                infer_json(v).map(|inferred| (k.clone(), inferred))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ClarityValue::Tuple),
    }
}

/// Guess a Clarity value for `input`. Text that parses as a JSON array,
/// object, or null is treated as JSON; anything else goes through the string
/// literal rules.
pub fn infer_value(input: &str) -> Result<ClarityValue, EncodeError> {
    match serde_json::from_str::<Value>(input) {
        Ok(json @ (Value::Array(_) | Value::Object(_) | Value::Null)) => infer_json(&json),
        _ => infer_str(input),
    }
}
