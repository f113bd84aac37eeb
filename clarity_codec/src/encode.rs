//! Type-directed encoding of human/JSON input into Clarity values.

use crate::c32;
use crate::types::TypeDescriptor;
use crate::value::{is_valid_contract_name, is_valid_field_name, ClarityValue};
use serde_json::Value;
use std::borrow::Cow;
use std::num::IntErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: &'static str },
    #[error("'{input}' is not a valid {ty} literal")]
    InvalidLiteral { ty: String, input: String },
    #[error("'{input}' is out of range for {ty}")]
    OutOfRange { ty: String, input: String },
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("{ty} holds at most {max} bytes, got {actual}")]
    TooLong { ty: String, max: u32, actual: usize },
    #[error("string-ascii value contains non-ASCII characters")]
    NonAscii,
    #[error("unknown tuple field '{0}'")]
    UnknownField(String),
    #[error("missing tuple field '{0}'")]
    MissingField(String),
    #[error("expected ok(..) or err(..) for {0}")]
    MissingResponseTag(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("no value can be encoded against the 'none' type")]
    NoType,
    #[error("invalid contract or field name '{0}'")]
    InvalidName(String),
    #[error("{field}: {source}")]
    Field {
        field: String,
        source: Box<EncodeError>,
    },
}

impl EncodeError {
    fn in_field(self, field: impl Into<String>) -> Self {
        EncodeError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Dotted path to the tuple field or list index that failed, if any.
    pub fn offending_field(&self) -> Option<String> {
        let mut path = Vec::new();
        let mut current = self;
        while let EncodeError::Field { field, source } = current {
            path.push(field.as_str());
            current = source;
        }
        if path.is_empty() {
            None
        } else {
            Some(path.join("."))
        }
    }

    /// The innermost error, without field context.
    pub fn root_cause(&self) -> &EncodeError {
        match self {
            EncodeError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `name(inner)` -> `inner`
pub(crate) fn strip_wrapper<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .trim()
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

/// `ADDRESS` or `ADDRESS.contract-name`.
pub(crate) fn parse_principal(input: &str) -> Result<ClarityValue, EncodeError> {
    let (address, name) = match input.split_once('.') {
        Some((address, name)) => (address, Some(name)),
        None => (input, None),
    };
    let (version, hash) =
        c32::address_decode(address).map_err(|e| EncodeError::InvalidPrincipal(e.to_string()))?;

    match name {
        None => Ok(ClarityValue::StandardPrincipal { version, hash }),
        Some(name) if is_valid_contract_name(name) => Ok(ClarityValue::ContractPrincipal {
            version,
            hash,
            name: name.to_string(),
        }),
        Some(name) => Err(EncodeError::InvalidName(name.to_string())),
    }
}

fn literal_text<'a>(input: &'a Value, ty: &TypeDescriptor) -> Result<Cow<'a, str>, EncodeError> {
    match input {
        Value::String(s) => Ok(Cow::Borrowed(s.trim())),
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        other => Err(EncodeError::TypeMismatch {
            expected: ty.to_string(),
            found: json_kind(other),
        }),
    }
}

fn parse_uint(text: &str) -> Result<u128, EncodeError> {
    let digits = text.strip_prefix('u').unwrap_or(text);
    digits.parse::<u128>().map_err(|e| {
        let negative = digits
            .strip_prefix('-')
            .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);
        if negative || matches!(e.kind(), IntErrorKind::PosOverflow) {
            EncodeError::OutOfRange {
                ty: "uint".to_string(),
                input: text.to_string(),
            }
        } else {
            EncodeError::InvalidLiteral {
                ty: "uint".to_string(),
                input: text.to_string(),
            }
        }
    })
}

fn parse_int(text: &str) -> Result<i128, EncodeError> {
    text.parse::<i128>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => EncodeError::OutOfRange {
            ty: "int".to_string(),
            input: text.to_string(),
        },
        _ => EncodeError::InvalidLiteral {
            ty: "int".to_string(),
            input: text.to_string(),
        },
    })
}

fn expect_str<'a>(input: &'a Value, ty: &TypeDescriptor) -> Result<&'a str, EncodeError> {
    input.as_str().ok_or_else(|| EncodeError::TypeMismatch {
        expected: ty.to_string(),
        found: json_kind(input),
    })
}

fn check_len(ty: &TypeDescriptor, max: u32, actual: usize) -> Result<(), EncodeError> {
    if actual > max as usize {
        return Err(EncodeError::TooLong {
            ty: ty.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

/// Tuples and lists arrive as JSON text when the caller passes a string.
fn parse_json_text(input: &Value) -> Result<Cow<'_, Value>, EncodeError> {
    match input {
        Value::String(s) => serde_json::from_str(s)
            .map(Cow::Owned)
            .map_err(|e| EncodeError::InvalidJson(e.to_string())),
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Encode `input` against `ty`.
pub fn encode_value(input: &Value, ty: &TypeDescriptor) -> Result<ClarityValue, EncodeError> {
    match ty {
        TypeDescriptor::UInt => Ok(ClarityValue::UInt(parse_uint(&literal_text(input, ty)?)?)),
        TypeDescriptor::Int => Ok(ClarityValue::Int(parse_int(&literal_text(input, ty)?)?)),
        TypeDescriptor::Bool => match input {
            Value::Bool(b) => Ok(ClarityValue::Bool(*b)),
            Value::String(s) if s.trim() == "true" => Ok(ClarityValue::Bool(true)),
            Value::String(s) if s.trim() == "false" => Ok(ClarityValue::Bool(false)),
            Value::String(s) => Err(EncodeError::InvalidLiteral {
                ty: "bool".to_string(),
                input: s.clone(),
            }),
            other => Err(EncodeError::TypeMismatch {
                expected: ty.to_string(),
                found: json_kind(other),
            }),
        },
        TypeDescriptor::Principal => parse_principal(expect_str(input, ty)?.trim()),
        TypeDescriptor::Buffer { max_len } => {
            let s = expect_str(input, ty)?;
            let bytes = match s.strip_prefix("0x") {
                Some(digits) => hex::decode(digits).map_err(|e| EncodeError::InvalidHex(e.to_string()))?,
                None => s.as_bytes().to_vec(),
            };
            check_len(ty, *max_len, bytes.len())?;
            Ok(ClarityValue::Buffer(bytes))
        }
        TypeDescriptor::StringAscii { max_len } => {
            let s = expect_str(input, ty)?;
            if !s.is_ascii() {
                return Err(EncodeError::NonAscii);
            }
            check_len(ty, *max_len, s.len())?;
            Ok(ClarityValue::StringAscii(s.to_string()))
        }
        TypeDescriptor::StringUtf8 { max_len } => {
            let s = expect_str(input, ty)?;
            check_len(ty, *max_len, s.len())?;
            Ok(ClarityValue::StringUtf8(s.to_string()))
        }
        TypeDescriptor::Optional(inner) => match input {
            Value::Null => Ok(ClarityValue::OptionalNone),
            Value::String(s) if s.trim() == "none" => Ok(ClarityValue::OptionalNone),
            Value::String(s) => match strip_wrapper(s, "some") {
                Some(wrapped) => Ok(ClarityValue::some(encode_value(
                    &Value::String(wrapped.to_string()),
                    inner,
                )?)),
                None => Ok(ClarityValue::some(encode_value(input, inner)?)),
            },
            other => Ok(ClarityValue::some(encode_value(other, inner)?)),
        },
        TypeDescriptor::Response { ok, err } => match input {
            Value::String(s) => {
                if let Some(wrapped) = strip_wrapper(s, "ok") {
                    Ok(ClarityValue::ok(encode_value(&Value::String(wrapped.to_string()), ok)?))
                } else if let Some(wrapped) = strip_wrapper(s, "err") {
                    Ok(ClarityValue::err(encode_value(&Value::String(wrapped.to_string()), err)?))
                } else {
                    Err(EncodeError::MissingResponseTag(ty.to_string()))
                }
            }
            Value::Object(map) if map.len() == 1 => {
                if let Some(v) = map.get("ok") {
                    Ok(ClarityValue::ok(encode_value(v, ok)?))
                } else if let Some(v) = map.get("err") {
                    Ok(ClarityValue::err(encode_value(v, err)?))
                } else {
                    Err(EncodeError::MissingResponseTag(ty.to_string()))
                }
            }
            _ => Err(EncodeError::MissingResponseTag(ty.to_string())),
        },
        TypeDescriptor::Tuple(fields) => {
            let parsed = parse_json_text(input)?;
            let map = parsed.as_object().ok_or_else(|| EncodeError::TypeMismatch {
                expected: ty.to_string(),
                found: json_kind(&parsed),
            })?;
            if let Some(unknown) = map.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                return Err(EncodeError::UnknownField(unknown.clone()));
            }
            let mut encoded = Vec::with_capacity(fields.len());
            for field in fields {
                if !is_valid_field_name(&field.name) {
                    return Err(EncodeError::InvalidName(field.name.clone()));
                }
                let raw = map
                    .get(&field.name)
                    .ok_or_else(|| EncodeError::MissingField(field.name.clone()))?;
                let value = encode_value(raw, &field.ty).map_err(|e| e.in_field(&field.name))?;
                encoded.push((field.name.clone(), value));
            }
            Ok(ClarityValue::Tuple(encoded))
        }
        TypeDescriptor::List { inner, max_len } => {
            let parsed = parse_json_text(input)?;
            let items = parsed.as_array().ok_or_else(|| EncodeError::TypeMismatch {
                expected: ty.to_string(),
                found: json_kind(&parsed),
            })?;
            if items.len() > *max_len as usize {
                return Err(EncodeError::TooLong {
                    ty: ty.to_string(),
                    max: *max_len,
                    actual: items.len(),
                });
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_value(item, inner).map_err(|e| e.in_field(i.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(ClarityValue::List)
        }
        TypeDescriptor::NoType => Err(EncodeError::NoType),
    }
}

/// Encode a raw string as received on a query string or path segment.
pub fn encode_arg(raw: &str, ty: &TypeDescriptor) -> Result<ClarityValue, EncodeError> {
    encode_value(&Value::String(raw.to_string()), ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MAX_NAME_LEN;
    use serde_json::json;

    const STX: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

    #[test]
    fn test_bool_literal() {
        assert_eq!(encode_arg("true", &TypeDescriptor::Bool).unwrap().to_hex(), "0x03");
        assert_eq!(encode_value(&json!(false), &TypeDescriptor::Bool).unwrap(), ClarityValue::Bool(false));
        assert!(matches!(
            encode_arg("True", &TypeDescriptor::Bool),
            Err(EncodeError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_bool_literal_is_trimmed() {
        assert_eq!(encode_arg(" true ", &TypeDescriptor::Bool).unwrap(), ClarityValue::Bool(true));
        assert_eq!(
            encode_value(&json!("false\n"), &TypeDescriptor::Bool).unwrap(),
            ClarityValue::Bool(false)
        );
    }

    #[test]
    fn test_uint_range() {
        assert_eq!(encode_arg("42", &TypeDescriptor::UInt).unwrap(), ClarityValue::UInt(42));
        assert_eq!(encode_arg("u42", &TypeDescriptor::UInt).unwrap(), ClarityValue::UInt(42));
        assert_eq!(encode_value(&json!(7), &TypeDescriptor::UInt).unwrap(), ClarityValue::UInt(7));
        assert_eq!(
            encode_arg(&u128::MAX.to_string(), &TypeDescriptor::UInt).unwrap(),
            ClarityValue::UInt(u128::MAX)
        );
        assert!(matches!(
            encode_arg("340282366920938463463374607431768211456", &TypeDescriptor::UInt),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            encode_arg("-1", &TypeDescriptor::UInt),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            encode_arg("abc", &TypeDescriptor::UInt),
            Err(EncodeError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_int_range() {
        assert_eq!(encode_arg("-17", &TypeDescriptor::Int).unwrap(), ClarityValue::Int(-17));
        assert_eq!(
            encode_arg(&i128::MIN.to_string(), &TypeDescriptor::Int).unwrap(),
            ClarityValue::Int(i128::MIN)
        );
        assert!(matches!(
            encode_arg("170141183460469231731687303715884105728", &TypeDescriptor::Int),
            Err(EncodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_principals() {
        assert!(matches!(
            encode_arg(STX, &TypeDescriptor::Principal).unwrap(),
            ClarityValue::StandardPrincipal { version: 22, .. }
        ));
        let contract = format!("{}.my-contract", STX);
        match encode_arg(&contract, &TypeDescriptor::Principal).unwrap() {
            ClarityValue::ContractPrincipal { name, .. } => assert_eq!(name, "my-contract"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            encode_arg(&format!("{}.9bad", STX), &TypeDescriptor::Principal),
            Err(EncodeError::InvalidName(_))
        ));
        assert!(matches!(
            encode_arg("SPNOTANADDRESS", &TypeDescriptor::Principal),
            Err(EncodeError::InvalidPrincipal(_))
        ));
    }

    #[test]
    fn test_buffer_hex_and_text() {
        let ty = TypeDescriptor::Buffer { max_len: 4 };
        assert_eq!(encode_arg("0xdeadbeef", &ty).unwrap(), ClarityValue::Buffer(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(encode_arg("abc", &ty).unwrap(), ClarityValue::Buffer(b"abc".to_vec()));
        assert!(matches!(encode_arg("0xzz", &ty), Err(EncodeError::InvalidHex(_))));
        assert!(matches!(
            encode_arg("0x0102030405", &ty),
            Err(EncodeError::TooLong { max: 4, actual: 5, .. })
        ));
    }

    #[test]
    fn test_strings() {
        let ascii = TypeDescriptor::StringAscii { max_len: 5 };
        assert_eq!(encode_arg("hello", &ascii).unwrap(), ClarityValue::StringAscii("hello".into()));
        assert_eq!(encode_arg("héllo", &ascii), Err(EncodeError::NonAscii));
        assert!(matches!(encode_arg("hello!", &ascii), Err(EncodeError::TooLong { .. })));

        let utf8 = TypeDescriptor::StringUtf8 { max_len: 6 };
        assert_eq!(encode_arg("héllo", &utf8).unwrap(), ClarityValue::StringUtf8("héllo".into()));
        assert!(matches!(encode_arg("héllo!", &utf8), Err(EncodeError::TooLong { .. })));
    }

    #[test]
    fn test_optional_forms() {
        let ty = TypeDescriptor::optional(TypeDescriptor::UInt);
        assert_eq!(encode_arg("none", &ty).unwrap(), ClarityValue::OptionalNone);
        assert_eq!(encode_value(&Value::Null, &ty).unwrap(), ClarityValue::OptionalNone);
        assert_eq!(encode_arg("some(5)", &ty).unwrap(), ClarityValue::some(ClarityValue::UInt(5)));
        assert_eq!(encode_arg("5", &ty).unwrap(), ClarityValue::some(ClarityValue::UInt(5)));
    }

    #[test]
    fn test_response_forms() {
        let ty = TypeDescriptor::response(TypeDescriptor::Bool, TypeDescriptor::UInt);
        assert_eq!(encode_arg("ok(true)", &ty).unwrap(), ClarityValue::ok(ClarityValue::Bool(true)));
        assert_eq!(encode_arg("err(3)", &ty).unwrap(), ClarityValue::err(ClarityValue::UInt(3)));
        assert_eq!(
            encode_value(&json!({ "err": 3 }), &ty).unwrap(),
            ClarityValue::err(ClarityValue::UInt(3))
        );
        assert!(matches!(encode_arg("true", &ty), Err(EncodeError::MissingResponseTag(_))));
    }

    #[test]
    fn test_tuple_declared_order_and_key_set() {
        let ty = TypeDescriptor::tuple([
            ("owner", TypeDescriptor::Principal),
            ("amount", TypeDescriptor::UInt),
        ]);
        let input = format!(r#"{{"amount": "10", "owner": "{}"}}"#, STX);
        match encode_arg(&input, &ty).unwrap() {
            ClarityValue::Tuple(fields) => {
                let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, ["owner", "amount"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            encode_value(&json!({ "amount": 1 }), &ty),
            Err(EncodeError::MissingField("owner".into()))
        );
        assert_eq!(
            encode_value(&json!({ "amount": 1, "owner": STX, "extra": true }), &ty),
            Err(EncodeError::UnknownField("extra".into()))
        );
        assert!(matches!(encode_arg("{not json", &ty), Err(EncodeError::InvalidJson(_))));
    }

    #[test]
    fn test_tuple_rejects_unserializable_field_names() {
        let long = "f".repeat(MAX_NAME_LEN + 1);
        let ty = TypeDescriptor::tuple([(long.as_str(), TypeDescriptor::UInt)]);
        let mut input = serde_json::Map::new();
        input.insert(long.clone(), json!(1));
        assert_eq!(
            encode_value(&Value::Object(input), &ty),
            Err(EncodeError::InvalidName(long))
        );

        let ty = TypeDescriptor::tuple([("bad key", TypeDescriptor::UInt)]);
        assert_eq!(
            encode_value(&json!({ "bad key": 1 }), &ty),
            Err(EncodeError::InvalidName("bad key".into()))
        );
    }

    #[test]
    fn test_nested_error_reports_field_path() {
        let ty = TypeDescriptor::tuple([(
            "items",
            TypeDescriptor::list(TypeDescriptor::UInt, 3),
        )]);
        let err = encode_value(&json!({ "items": [1, "x"] }), &ty).unwrap_err();
        assert_eq!(err.offending_field().as_deref(), Some("items.1"));
        assert!(matches!(err.root_cause(), EncodeError::InvalidLiteral { .. }));
    }

    #[test]
    fn test_list_length() {
        let ty = TypeDescriptor::list(TypeDescriptor::Int, 2);
        assert_eq!(
            encode_arg("[1, -2]", &ty).unwrap(),
            ClarityValue::List(vec![ClarityValue::Int(1), ClarityValue::Int(-2)])
        );
        assert!(matches!(encode_arg("[1, 2, 3]", &ty), Err(EncodeError::TooLong { .. })));
    }

    #[test]
    fn test_no_type_rejected() {
        assert_eq!(encode_arg("anything", &TypeDescriptor::NoType), Err(EncodeError::NoType));
    }
}
