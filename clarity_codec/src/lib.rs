//! Stacks/Bitcoin address translation and Clarity value codec.
//!
//! Everything here is a pure function of its inputs and never logs. Failures
//! come back as typed errors for the HTTP layer to translate.

pub mod abi;
pub mod address;
pub mod c32;
pub mod decode;
pub mod encode;
pub mod infer;
pub mod matcher;
pub mod types;
pub mod value;

pub use abi::{AbiFunction, AbiFunctionArg, AbiMap, AbiVariable, ContractInterface, FunctionAccess};
pub use address::{translate, AddressError, AddressFamily, AddressInfo, DecodedAddress, Network};
pub use decode::{decode_hex, decode_to_json, decode_value, unwrap_value, DecodeError};
pub use encode::{encode_arg, encode_value, EncodeError};
pub use infer::infer_value;
pub use matcher::{find_function, find_map, match_args, match_map_key, AbiMemberKind, ArgEncoding, MatchError};
pub use types::{TupleField, TypeDescriptor};
pub use value::ClarityValue;
