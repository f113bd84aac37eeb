//! Clarity consensus deserialization and the unwrap policy.

use crate::c32::HASH160_LEN;
use crate::value::{is_valid_contract_name, is_valid_field_name, tag, ClarityValue};
use serde_json::Value;
use thiserror::Error;

/// Deepest nesting accepted before giving up on a value.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),
    #[error("unknown type tag 0x{tag:02x} at byte {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("string-ascii contains non-ASCII bytes")]
    InvalidAscii,
    #[error("string-utf8 is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid name '{0}'")]
    InvalidName(String),
    #[error("principal version {0} is out of range")]
    InvalidPrincipalVersion(u8),
    #[error("value nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEnd(self.bytes.len()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn sixteen(&mut self) -> Result<[u8; 16], DecodeError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn hash(&mut self) -> Result<(u8, [u8; HASH160_LEN]), DecodeError> {
        let version = self.u8()?;
        if version >= 32 {
            return Err(DecodeError::InvalidPrincipalVersion(version));
        }
        let mut hash = [0u8; HASH160_LEN];
        hash.copy_from_slice(self.take(HASH160_LEN)?);
        Ok((version, hash))
    }

    fn short_name(&mut self) -> Result<String, DecodeError> {
        let len = self.u8()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| DecodeError::InvalidName(String::from_utf8_lossy(raw).into_owned()))
    }

    fn value(&mut self, depth: usize) -> Result<ClarityValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep);
        }
        let offset = self.pos;
        let value = match self.u8()? {
            tag::INT => ClarityValue::Int(i128::from_be_bytes(self.sixteen()?)),
            tag::UINT => ClarityValue::UInt(u128::from_be_bytes(self.sixteen()?)),
            tag::BUFFER => {
                let len = self.u32()? as usize;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            tag::BOOL_TRUE => ClarityValue::Bool(true),
            tag::BOOL_FALSE => ClarityValue::Bool(false),
            tag::PRINCIPAL_STANDARD => {
                let (version, hash) = self.hash()?;
                ClarityValue::StandardPrincipal { version, hash }
            }
            tag::PRINCIPAL_CONTRACT => {
                let (version, hash) = self.hash()?;
                let name = self.short_name()?;
                if !is_valid_contract_name(&name) {
                    return Err(DecodeError::InvalidName(name));
                }
                ClarityValue::ContractPrincipal {
                    version,
                    hash,
                    name,
                }
            }
            tag::RESPONSE_OK => ClarityValue::ok(self.value(depth + 1)?),
            tag::RESPONSE_ERR => ClarityValue::err(self.value(depth + 1)?),
            tag::OPTIONAL_NONE => ClarityValue::OptionalNone,
            tag::OPTIONAL_SOME => ClarityValue::some(self.value(depth + 1)?),
            tag::LIST => {
                let count = self.u32()? as usize;
                // Each element is at least one byte.
                let mut items = Vec::with_capacity(count.min(self.bytes.len() - self.pos));
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            tag::TUPLE => {
                let count = self.u32()? as usize;
                let mut fields = Vec::with_capacity(count.min(self.bytes.len() - self.pos));
                for _ in 0..count {
                    let name = self.short_name()?;
                    if !is_valid_field_name(&name) {
                        return Err(DecodeError::InvalidName(name));
                    }
                    fields.push((name, self.value(depth + 1)?));
                }
                ClarityValue::Tuple(fields)
            }
            tag::STRING_ASCII => {
                let len = self.u32()? as usize;
                let raw = self.take(len)?;
                if !raw.is_ascii() {
                    return Err(DecodeError::InvalidAscii);
                }
                ClarityValue::StringAscii(String::from_utf8_lossy(raw).into_owned())
            }
            tag::STRING_UTF8 => {
                let len = self.u32()? as usize;
                let raw = self.take(len)?;
                ClarityValue::StringUtf8(
                    String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)?,
                )
            }
            other => return Err(DecodeError::UnknownTag { tag: other, offset }),
        };
        Ok(value)
    }
}

/// Deserialize exactly one value from `bytes`.
pub fn decode_value(bytes: &[u8]) -> Result<ClarityValue, DecodeError> {
    let mut reader = Reader::new(bytes);
    let value = reader.value(0)?;
    let remaining = bytes.len() - reader.pos;
    if remaining > 0 {
        return Err(DecodeError::TrailingBytes(remaining));
    }
    Ok(value)
}

/// Deserialize a hex string, with or without a `0x` prefix.
pub fn decode_hex(input: &str) -> Result<ClarityValue, DecodeError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    decode_value(&bytes)
}

/// Strip the outer chain of `some`, `ok`, and `err` layers.
pub fn unwrap_value(mut value: ClarityValue) -> ClarityValue {
    loop {
        value = match value {
            ClarityValue::OptionalSome(inner)
            | ClarityValue::ResponseOk(inner)
            | ClarityValue::ResponseErr(inner) => *inner,
            other => return other,
        };
    }
}

/// Decode and project to plain JSON, optionally stripping the outer
/// some/ok/err chain first.
pub fn decode_to_json(bytes: &[u8], unwrap: bool) -> Result<Value, DecodeError> {
    let value = decode_value(bytes)?;
    if unwrap {
        Ok(unwrap_value(value).to_json())
    } else {
        Ok(value.to_json())
    }
}
