//! Aligns caller-supplied positional arguments with an ABI's declared
//! parameter types.

use crate::abi::{AbiFunction, AbiFunctionArg, AbiMap, ContractInterface};
use crate::encode::{encode_arg, EncodeError};
use std::fmt;
use thiserror::Error;

/// How raw argument strings are to be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgEncoding {
    /// Human-readable literals, encoded against the declared type.
    #[default]
    Raw,
    /// Already-serialized hex values, forwarded untouched.
    PreEncoded,
}

impl ArgEncoding {
    pub fn from_flag(pre_encoded: bool) -> Self {
        if pre_encoded {
            ArgEncoding::PreEncoded
        } else {
            ArgEncoding::Raw
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiMemberKind {
    Function,
    Map,
    Variable,
}

impl fmt::Display for AbiMemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiMemberKind::Function => write!(f, "function"),
            AbiMemberKind::Map => write!(f, "map"),
            AbiMemberKind::Variable => write!(f, "variable"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("expected {expected} arguments, received {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("contract has no {kind} named '{name}'")]
    UnknownAbiMember { kind: AbiMemberKind, name: String },
    #[error("could not encode '{input}' as {ty} for argument '{name}': {source}")]
    Encode {
        name: String,
        ty: String,
        input: String,
        source: EncodeError,
    },
}

pub fn find_function<'a>(abi: &'a ContractInterface, name: &str) -> Result<&'a AbiFunction, MatchError> {
    abi.find_function(name).ok_or_else(|| MatchError::UnknownAbiMember {
        kind: AbiMemberKind::Function,
        name: name.to_string(),
    })
}

pub fn find_map<'a>(abi: &'a ContractInterface, name: &str) -> Result<&'a AbiMap, MatchError> {
    abi.find_map(name).ok_or_else(|| MatchError::UnknownAbiMember {
        kind: AbiMemberKind::Map,
        name: name.to_string(),
    })
}

/// Pair `raw_args` positionally with `params` and serialize each one to
/// `0x` hex. Arity is checked before anything is encoded.
pub fn match_args<S: AsRef<str>>(
    raw_args: &[S],
    params: &[AbiFunctionArg],
    encoding: ArgEncoding,
) -> Result<Vec<String>, MatchError> {
    if raw_args.len() != params.len() {
        return Err(MatchError::ArityMismatch {
            expected: params.len(),
            actual: raw_args.len(),
        });
    }

    raw_args
        .iter()
        .zip(params)
        .map(|(raw, param)| {
            let raw = raw.as_ref();
            match encoding {
                ArgEncoding::PreEncoded => Ok(raw.to_string()),
                ArgEncoding::Raw => encode_arg(raw, &param.ty)
                    .map(|value| value.to_hex())
                    .map_err(|source| MatchError::Encode {
                        name: param.name.clone(),
                        ty: param.ty.to_string(),
                        input: raw.to_string(),
                        source,
                    }),
            }
        })
        .collect()
}

/// Serialize a map key against the map's declared key type.
pub fn match_map_key(raw_key: &str, map: &AbiMap, encoding: ArgEncoding) -> Result<String, MatchError> {
    let param = AbiFunctionArg {
        name: "key".to_string(),
        ty: map.key.clone(),
    };
    let mut encoded = match_args(&[raw_key], std::slice::from_ref(&param), encoding)?;
    Ok(encoded.remove(0))
}
