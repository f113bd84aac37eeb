//! Clarity values, their consensus serialization, and JSON projections.

use crate::c32::{self, HASH160_LEN};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

/// Leading byte of every serialized value.
pub mod tag {
    pub const INT: u8 = 0x00;
    pub const UINT: u8 = 0x01;
    pub const BUFFER: u8 = 0x02;
    pub const BOOL_TRUE: u8 = 0x03;
    pub const BOOL_FALSE: u8 = 0x04;
    pub const PRINCIPAL_STANDARD: u8 = 0x05;
    pub const PRINCIPAL_CONTRACT: u8 = 0x06;
    pub const RESPONSE_OK: u8 = 0x07;
    pub const RESPONSE_ERR: u8 = 0x08;
    pub const OPTIONAL_NONE: u8 = 0x09;
    pub const OPTIONAL_SOME: u8 = 0x0a;
    pub const LIST: u8 = 0x0b;
    pub const TUPLE: u8 = 0x0c;
    pub const STRING_ASCII: u8 = 0x0d;
    pub const STRING_UTF8: u8 = 0x0e;
}

/// Longest contract or tuple field name.
pub const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Buffer(Vec<u8>),
    StandardPrincipal {
        version: u8,
        hash: [u8; HASH160_LEN],
    },
    ContractPrincipal {
        version: u8,
        hash: [u8; HASH160_LEN],
        name: String,
    },
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    /// Fields in declaration order.
    Tuple(Vec<(String, ClarityValue)>),
    StringAscii(String),
    StringUtf8(String),
}

static CONTRACT_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]([a-zA-Z0-9]|[-_])*$").expect("valid regex"));

/// Printable ASCII other than space and parens.
static FIELD_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[!-'*-~]+$").expect("valid regex"));

/// At most [`MAX_NAME_LEN`] bytes.
pub fn is_valid_contract_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && CONTRACT_NAME_REGEX.is_match(name)
}

/// Tuple field names: non-empty, ASCII, no whitespace or parens.
pub fn is_valid_field_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && FIELD_NAME_REGEX.is_match(name)
}

/// u8 length prefix then the bytes. Names past [`MAX_NAME_LEN`] are clamped so
/// the prefix always matches what follows.
fn write_name(out: &mut Vec<u8>, name: &str) {
    let bytes = &name.as_bytes()[..name.len().min(MAX_NAME_LEN)];
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

fn principal_address(version: u8, hash: &[u8; HASH160_LEN]) -> String {
    c32::address_encode(version, hash)
        .unwrap_or_else(|_| format!("{}:{}", version, hex::encode(hash)))
}

impl ClarityValue {
    pub fn some(inner: ClarityValue) -> Self {
        ClarityValue::OptionalSome(Box::new(inner))
    }

    pub fn ok(inner: ClarityValue) -> Self {
        ClarityValue::ResponseOk(Box::new(inner))
    }

    pub fn err(inner: ClarityValue) -> Self {
        ClarityValue::ResponseErr(Box::new(inner))
    }

    pub fn type_tag(&self) -> u8 {
        match self {
            ClarityValue::Int(_) => tag::INT,
            ClarityValue::UInt(_) => tag::UINT,
            ClarityValue::Bool(true) => tag::BOOL_TRUE,
            ClarityValue::Bool(false) => tag::BOOL_FALSE,
            ClarityValue::Buffer(_) => tag::BUFFER,
            ClarityValue::StandardPrincipal { .. } => tag::PRINCIPAL_STANDARD,
            ClarityValue::ContractPrincipal { .. } => tag::PRINCIPAL_CONTRACT,
            ClarityValue::ResponseOk(_) => tag::RESPONSE_OK,
            ClarityValue::ResponseErr(_) => tag::RESPONSE_ERR,
            ClarityValue::OptionalNone => tag::OPTIONAL_NONE,
            ClarityValue::OptionalSome(_) => tag::OPTIONAL_SOME,
            ClarityValue::List(_) => tag::LIST,
            ClarityValue::Tuple(_) => tag::TUPLE,
            ClarityValue::StringAscii(_) => tag::STRING_ASCII,
            ClarityValue::StringUtf8(_) => tag::STRING_UTF8,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize_into(&mut out);
        out
    }

    /// `0x`-prefixed hex of the serialized value, as the Stacks node expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(self.type_tag());
        match self {
            ClarityValue::Int(n) => out.extend_from_slice(&n.to_be_bytes()),
            ClarityValue::UInt(n) => out.extend_from_slice(&n.to_be_bytes()),
            ClarityValue::Bool(_) | ClarityValue::OptionalNone => {}
            ClarityValue::Buffer(bytes) => {
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            ClarityValue::StandardPrincipal { version, hash } => {
                out.push(*version);
                out.extend_from_slice(hash);
            }
            ClarityValue::ContractPrincipal {
                version,
                hash,
                name,
            } => {
                out.push(*version);
                out.extend_from_slice(hash);
                write_name(out, name);
            }
            ClarityValue::ResponseOk(inner)
            | ClarityValue::ResponseErr(inner)
            | ClarityValue::OptionalSome(inner) => inner.serialize_into(out),
            ClarityValue::List(items) => {
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.serialize_into(out);
                }
            }
            ClarityValue::Tuple(fields) => {
                out.extend_from_slice(&(fields.len() as u32).to_be_bytes());
                for (name, value) in fields {
                    write_name(out, name);
                    value.serialize_into(out);
                }
            }
            ClarityValue::StringAscii(s) | ClarityValue::StringUtf8(s) => {
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Clarity type signature inferred from the value itself. Sides of a
    /// response or the element type of an empty list that the value does not
    /// reveal render as `UnknownType`.
    pub fn type_string(&self) -> String {
        match self {
            ClarityValue::Int(_) => "int".to_string(),
            ClarityValue::UInt(_) => "uint".to_string(),
            ClarityValue::Bool(_) => "bool".to_string(),
            ClarityValue::Buffer(bytes) => format!("(buff {})", bytes.len()),
            ClarityValue::StandardPrincipal { .. } | ClarityValue::ContractPrincipal { .. } => {
                "principal".to_string()
            }
            ClarityValue::ResponseOk(inner) => format!("(response {} UnknownType)", inner.type_string()),
            ClarityValue::ResponseErr(inner) => format!("(response UnknownType {})", inner.type_string()),
            ClarityValue::OptionalNone => "(optional none)".to_string(),
            ClarityValue::OptionalSome(inner) => format!("(optional {})", inner.type_string()),
            ClarityValue::List(items) => format!(
                "(list {} {})",
                items.len(),
                items
                    .first()
                    .map(|i| i.type_string())
                    .unwrap_or_else(|| "UnknownType".to_string())
            ),
            ClarityValue::Tuple(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("({} {})", name, value.type_string()))
                    .collect();
                format!("(tuple {})", inner.join(" "))
            }
            ClarityValue::StringAscii(s) => format!("(string-ascii {})", s.len()),
            ClarityValue::StringUtf8(s) => format!("(string-utf8 {})", s.len()),
        }
    }

    /// Plain JSON projection. Integers become decimal strings so 128-bit
    /// values survive JSON number parsing; wrapped and nested values use the
    /// typed projection.
    pub fn to_json(&self) -> Value {
        match self {
            ClarityValue::Int(n) => Value::String(n.to_string()),
            ClarityValue::UInt(n) => Value::String(n.to_string()),
            ClarityValue::Bool(b) => Value::Bool(*b),
            ClarityValue::Buffer(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            ClarityValue::StandardPrincipal { version, hash } => {
                Value::String(principal_address(*version, hash))
            }
            ClarityValue::ContractPrincipal {
                version,
                hash,
                name,
            } => Value::String(format!("{}.{}", principal_address(*version, hash), name)),
            ClarityValue::OptionalNone => Value::Null,
            ClarityValue::ResponseOk(inner)
            | ClarityValue::ResponseErr(inner)
            | ClarityValue::OptionalSome(inner) => inner.to_typed_json(),
            ClarityValue::List(items) => {
                Value::Array(items.iter().map(ClarityValue::to_typed_json).collect())
            }
            ClarityValue::Tuple(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_typed_json());
                }
                Value::Object(map)
            }
            ClarityValue::StringAscii(s) | ClarityValue::StringUtf8(s) => Value::String(s.clone()),
        }
    }

    /// `{"type": .., "value": ..}` projection; responses also carry `success`.
    pub fn to_typed_json(&self) -> Value {
        let ty = self.type_string();
        match self {
            ClarityValue::ResponseOk(inner) => {
                json!({ "type": ty, "value": inner.to_typed_json(), "success": true })
            }
            ClarityValue::ResponseErr(inner) => {
                json!({ "type": ty, "value": inner.to_typed_json(), "success": false })
            }
            ClarityValue::OptionalNone => json!({ "type": ty, "value": Value::Null }),
            ClarityValue::OptionalSome(inner) => json!({ "type": ty, "value": inner.to_typed_json() }),
            ClarityValue::List(items) => json!({
                "type": ty,
                "value": items.iter().map(ClarityValue::to_typed_json).collect::<Vec<_>>(),
            }),
            ClarityValue::Tuple(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_typed_json());
                }
                json!({ "type": ty, "value": Value::Object(map) })
            }
            _ => json!({ "type": ty, "value": self.to_json() }),
        }
    }
}
