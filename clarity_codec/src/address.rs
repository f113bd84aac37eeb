//! Stacks <-> Bitcoin address translation.
//!
//! Both chains wrap the same 20-byte hash with a version byte and a
//! double-SHA-256 checksum; only the alphabet (c32 vs base58) and the version
//! numbering differ. Translation therefore never touches the hash itself.

use crate::c32::{self, C32Error, HASH160_LEN};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const BASE58_PAYLOAD_LEN: usize = 1 + HASH160_LEN + 4;

/// `S` followed by c32 digits.
static STACKS_ADDRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S[0-9A-HJKMNP-TV-Z]+$").expect("valid regex"));

/// Bitcoin base58 alphabet (no `0`, `O`, `I`, `l`).
static BASE58_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]+$").expect("valid regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),
    #[error("invalid address checksum")]
    InvalidChecksum,
    #[error("unsupported address version byte: {0}")]
    UnsupportedVersionByte(u8),
    #[error("cannot convert an address to network '{0}'")]
    InvalidTargetNetwork(Network),
}

impl From<C32Error> for AddressError {
    fn from(err: C32Error) -> Self {
        match err {
            C32Error::InvalidChecksum => AddressError::InvalidChecksum,
            C32Error::InvalidVersion(v) => AddressError::UnsupportedVersionByte(v),
            other => AddressError::InvalidAddressFormat(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Other,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "other" => Ok(Network::Other),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Stacks,
    Bitcoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashMode {
    PubKeyHash,
    ScriptHash,
}

struct VersionEntry {
    mode: HashMode,
    network: Network,
    stacks: u8,
    bitcoin: u8,
}

const VERSIONS: [VersionEntry; 4] = [
    VersionEntry { mode: HashMode::PubKeyHash, network: Network::Mainnet, stacks: 22, bitcoin: 0 },
    VersionEntry { mode: HashMode::ScriptHash, network: Network::Mainnet, stacks: 20, bitcoin: 5 },
    VersionEntry { mode: HashMode::PubKeyHash, network: Network::Testnet, stacks: 26, bitcoin: 111 },
    VersionEntry { mode: HashMode::ScriptHash, network: Network::Testnet, stacks: 21, bitcoin: 196 },
];

fn entry_for(family: AddressFamily, version: u8) -> Option<&'static VersionEntry> {
    VERSIONS.iter().find(|e| match family {
        AddressFamily::Stacks => e.stacks == version,
        AddressFamily::Bitcoin => e.bitcoin == version,
    })
}

/// A checksum-verified address in its native encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub raw_input: String,
    pub family: AddressFamily,
    /// Version byte in the numbering of `family`.
    pub version: u8,
    pub hash: [u8; HASH160_LEN],
}

/// Response shape of an address translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub stacks: String,
    pub bitcoin: String,
    pub network: Network,
}

fn is_stacks_shaped(input: &str) -> bool {
    STACKS_ADDRESS_REGEX.is_match(input)
}

fn is_base58_shaped(input: &str) -> bool {
    BASE58_REGEX.is_match(input)
}

impl DecodedAddress {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if is_stacks_shaped(input) {
            let (version, hash) = c32::address_decode(input)?;
            return Ok(Self {
                raw_input: input.to_string(),
                family: AddressFamily::Stacks,
                version,
                hash,
            });
        }

        if is_base58_shaped(input) {
            let bytes = bs58::decode(input)
                .into_vec()
                .map_err(|e| AddressError::InvalidAddressFormat(e.to_string()))?;
            if bytes.len() != BASE58_PAYLOAD_LEN {
                return Err(AddressError::InvalidAddressFormat(format!(
                    "base58 payload must be {} bytes, found {}",
                    BASE58_PAYLOAD_LEN,
                    bytes.len()
                )));
            }
            let (body, checksum) = bytes.split_at(1 + HASH160_LEN);
            if c32::double_sha256_checksum(body) != checksum {
                return Err(AddressError::InvalidChecksum);
            }
            let mut hash = [0u8; HASH160_LEN];
            hash.copy_from_slice(&body[1..]);
            return Ok(Self {
                raw_input: input.to_string(),
                family: AddressFamily::Bitcoin,
                version: body[0],
                hash,
            });
        }

        Err(AddressError::InvalidAddressFormat(format!(
            "'{}' is neither a Stacks nor a Bitcoin address",
            input
        )))
    }

    pub fn network(&self) -> Network {
        entry_for(self.family, self.version)
            .map(|e| e.network)
            .unwrap_or(Network::Other)
    }

    /// Version byte under Stacks numbering. Unknown versions pass through.
    pub fn stacks_version(&self) -> u8 {
        match (self.family, entry_for(self.family, self.version)) {
            (AddressFamily::Bitcoin, Some(e)) => e.stacks,
            _ => self.version,
        }
    }

    /// Version byte under Bitcoin numbering. Unknown versions pass through.
    pub fn bitcoin_version(&self) -> u8 {
        match (self.family, entry_for(self.family, self.version)) {
            (AddressFamily::Stacks, Some(e)) => e.bitcoin,
            _ => self.version,
        }
    }

    pub fn to_stacks(&self) -> Result<String, AddressError> {
        Ok(c32::address_encode(self.stacks_version(), &self.hash)?)
    }

    pub fn to_bitcoin(&self) -> String {
        let mut payload = Vec::with_capacity(BASE58_PAYLOAD_LEN);
        payload.push(self.bitcoin_version());
        payload.extend_from_slice(&self.hash);
        let checksum = c32::double_sha256_checksum(&payload);
        payload.extend_from_slice(&checksum);
        bs58::encode(&payload).into_string()
    }

    /// Swap the version byte for the sibling on `target` that keeps the same
    /// hash mode. The hash is never modified.
    pub fn with_network(&self, target: Network) -> Result<Self, AddressError> {
        if target == Network::Other {
            return Err(AddressError::InvalidTargetNetwork(target));
        }
        let current = entry_for(self.family, self.version)
            .ok_or(AddressError::UnsupportedVersionByte(self.version))?;
        if current.network == target {
            return Ok(self.clone());
        }

        let sibling = VERSIONS
            .iter()
            .find(|e| e.mode == current.mode && e.network == target)
            .ok_or(AddressError::UnsupportedVersionByte(self.version))?;
        let version = match self.family {
            AddressFamily::Stacks => sibling.stacks,
            AddressFamily::Bitcoin => sibling.bitcoin,
        };

        Ok(Self {
            version,
            ..self.clone()
        })
    }

    pub fn info(&self) -> Result<AddressInfo, AddressError> {
        Ok(AddressInfo {
            stacks: self.to_stacks()?,
            bitcoin: self.to_bitcoin(),
            network: self.network(),
        })
    }
}

/// Validate `input`, optionally move it to `target`, and report both
/// encodings.
pub fn translate(input: &str, target: Option<Network>) -> Result<AddressInfo, AddressError> {
    let mut decoded = DecodedAddress::parse(input)?;
    if let Some(target) = target {
        if decoded.network() != target {
            decoded = decoded.with_network(target)?;
        }
    }
    decoded.info()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STX: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const BTC: &str = "1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6d";

    #[test]
    fn test_stacks_to_bitcoin() {
        let info = translate(STX, None).unwrap();
        assert_eq!(info.bitcoin, BTC);
        assert_eq!(info.stacks, STX);
        assert_eq!(info.network, Network::Mainnet);
    }

    #[test]
    fn test_bitcoin_back_to_stacks_on_mainnet() {
        let info = translate(BTC, Some(Network::Mainnet)).unwrap();
        assert_eq!(info.stacks, STX);
        assert_eq!(info.bitcoin, BTC);
    }

    #[test]
    fn test_testnet_remap_keeps_hash() {
        let info = translate(STX, Some(Network::Testnet)).unwrap();
        assert!(info.stacks.starts_with("ST"));
        assert!(info.bitcoin.starts_with('m') || info.bitcoin.starts_with('n'));
        assert_eq!(info.network, Network::Testnet);

        let original = DecodedAddress::parse(STX).unwrap();
        let remapped = DecodedAddress::parse(&info.stacks).unwrap();
        assert_eq!(original.hash, remapped.hash);

        let back = translate(&info.stacks, Some(Network::Mainnet)).unwrap();
        assert_eq!(back.stacks, STX);
    }

    #[test]
    fn test_script_hash_remap_preserves_mode() {
        let hash = DecodedAddress::parse(STX).unwrap().hash;
        let multisig = c32::address_encode(20, &hash).unwrap();
        assert!(multisig.starts_with("SM"));

        let info = translate(&multisig, None).unwrap();
        assert!(info.bitcoin.starts_with('3'));

        let testnet = translate(&multisig, Some(Network::Testnet)).unwrap();
        assert!(testnet.stacks.starts_with("SN"));
        assert!(testnet.bitcoin.starts_with('2'));

        let mainnet = translate(&testnet.stacks, Some(Network::Mainnet)).unwrap();
        assert_eq!(mainnet.stacks, multisig);
    }

    #[test]
    fn test_remap_is_idempotent() {
        let once = translate(STX, Some(Network::Testnet)).unwrap();
        let twice = translate(&once.stacks, Some(Network::Testnet)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_corrupted_base58_checksum() {
        let mut bytes = bs58::decode(BTC).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let forged = bs58::encode(&bytes).into_string();
        assert_eq!(translate(&forged, None), Err(AddressError::InvalidChecksum));
    }

    #[test]
    fn test_unrecognized_input() {
        assert!(matches!(
            translate("not an address!", None),
            Err(AddressError::InvalidAddressFormat(_))
        ));
        assert!(matches!(
            translate("", None),
            Err(AddressError::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_address_shapes() {
        assert!(is_stacks_shaped(STX));
        assert!(!is_stacks_shaped("S"));
        assert!(!is_stacks_shaped("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJU"));
        assert!(!is_stacks_shaped(&STX.to_lowercase()));
        assert!(is_base58_shaped(BTC));
        assert!(!is_base58_shaped(""));
        assert!(!is_base58_shaped("1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6O"));
        assert!(!is_base58_shaped("1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6l"));
        assert!(!is_base58_shaped("1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH60"));
    }

    #[test]
    fn test_unknown_version_reports_other_and_refuses_remap() {
        let hash = DecodedAddress::parse(STX).unwrap().hash;
        let odd = c32::address_encode(1, &hash).unwrap();
        let info = translate(&odd, None).unwrap();
        assert_eq!(info.network, Network::Other);
        assert_eq!(
            translate(&odd, Some(Network::Mainnet)),
            Err(AddressError::UnsupportedVersionByte(1))
        );
    }

    #[test]
    fn test_other_is_not_a_target() {
        assert_eq!(
            translate(STX, Some(Network::Other)),
            Err(AddressError::InvalidTargetNetwork(Network::Other))
        );
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("MainNet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("regtest".parse::<Network>().is_err());
    }
}
