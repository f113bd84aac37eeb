//! Crockford-style base-32 ("c32") encoding and the c32check scheme used by
//! Stacks addresses.

use sha2::{Digest, Sha256};
use thiserror::Error;

pub const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the hash carried by every standard address.
pub const HASH160_LEN: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum C32Error {
    #[error("invalid c32 character '{0}'")]
    InvalidCharacter(char),
    #[error("c32 version {0} does not fit in a single digit")]
    InvalidVersion(u8),
    #[error("c32 address must start with 'S'")]
    MissingPrefix,
    #[error("c32 payload too short")]
    TooShort,
    #[error("expected a {HASH160_LEN}-byte hash, found {0} bytes")]
    InvalidHashLength(usize),
    #[error("c32check checksum mismatch")]
    InvalidChecksum,
}

/// First four bytes of SHA-256(SHA-256(bytes)), shared by c32check and
/// base58check.
pub fn double_sha256_checksum(bytes: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(bytes));
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&digest[..4]);
    checksum
}

pub fn is_c32_char(c: char) -> bool {
    c.is_ascii() && C32_ALPHABET.contains(&(c as u8))
}

fn digit_value(c: char) -> Result<u8, C32Error> {
    let normalized = match c.to_ascii_uppercase() {
        'O' => '0',
        'I' | 'L' => '1',
        other => other,
    };
    C32_ALPHABET
        .iter()
        .position(|d| *d as char == normalized)
        .map(|p| p as u8)
        .ok_or(C32Error::InvalidCharacter(c))
}

/// Encode bytes as a c32 number, keeping one `0` digit per leading zero byte.
pub fn encode(data: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for &byte in data.iter().rev() {
        acc |= (byte as u32) << bits;
        bits += 8;
        while bits >= 5 {
            digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
            acc >>= 5;
            bits -= 5;
        }
    }
    if bits > 0 {
        digits.push(C32_ALPHABET[(acc & 0x1f) as usize]);
    }

    while digits.last() == Some(&b'0') {
        digits.pop();
    }
    let leading_zero_bytes = data.iter().take_while(|b| **b == 0).count();
    digits.extend(std::iter::repeat(b'0').take(leading_zero_bytes));

    digits.iter().rev().map(|d| *d as char).collect()
}

/// Decode a c32 string. Lowercase input and the ambiguous `O`, `I`, `L`
/// characters are normalized first.
pub fn decode(input: &str) -> Result<Vec<u8>, C32Error> {
    let values = input
        .chars()
        .map(digit_value)
        .collect::<Result<Vec<u8>, _>>()?;

    let mut bytes: Vec<u8> = Vec::with_capacity(values.len() * 5 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for &value in values.iter().rev() {
        acc |= (value as u32) << bits;
        bits += 5;
        while bits >= 8 {
            bytes.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 && acc != 0 {
        bytes.push(acc as u8);
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    let leading_zero_digits = values.iter().take_while(|v| **v == 0).count();
    bytes.extend(std::iter::repeat(0u8).take(leading_zero_digits));
    bytes.reverse();

    Ok(bytes)
}

/// `version digit ‖ c32(data ‖ checksum(version ‖ data))`
pub fn check_encode(version: u8, data: &[u8]) -> Result<String, C32Error> {
    if version as usize >= C32_ALPHABET.len() {
        return Err(C32Error::InvalidVersion(version));
    }

    let mut versioned = Vec::with_capacity(data.len() + 1);
    versioned.push(version);
    versioned.extend_from_slice(data);
    let checksum = double_sha256_checksum(&versioned);

    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum);

    let mut out = String::with_capacity(payload.len() * 8 / 5 + 2);
    out.push(C32_ALPHABET[version as usize] as char);
    out.push_str(&encode(&payload));
    Ok(out)
}

pub fn check_decode(input: &str) -> Result<(u8, Vec<u8>), C32Error> {
    let mut chars = input.chars();
    let version = match chars.next() {
        Some(c) => digit_value(c)?,
        None => return Err(C32Error::TooShort),
    };

    let payload = decode(chars.as_str())?;
    if payload.len() < 4 {
        return Err(C32Error::TooShort);
    }

    let (data, checksum) = payload.split_at(payload.len() - 4);
    let mut versioned = Vec::with_capacity(data.len() + 1);
    versioned.push(version);
    versioned.extend_from_slice(data);
    if double_sha256_checksum(&versioned) != checksum {
        return Err(C32Error::InvalidChecksum);
    }

    Ok((version, data.to_vec()))
}

/// Render a Stacks address: `S` followed by the c32check encoding.
pub fn address_encode(version: u8, hash160: &[u8; HASH160_LEN]) -> Result<String, C32Error> {
    Ok(format!("S{}", check_encode(version, hash160)?))
}

pub fn address_decode(address: &str) -> Result<(u8, [u8; HASH160_LEN]), C32Error> {
    let rest = address.strip_prefix('S').ok_or(C32Error::MissingPrefix)?;
    let (version, data) = check_decode(rest)?;
    let hash: [u8; HASH160_LEN] = data
        .as_slice()
        .try_into()
        .map_err(|_| C32Error::InvalidHashLength(data.len()))?;
    Ok((version, hash))
}
