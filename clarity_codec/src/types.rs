//! Clarity type descriptors as declared in a contract interface (ABI).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared shape of a value, argument, or map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAbiType", into = "RawAbiType")]
pub enum TypeDescriptor {
    UInt,
    Int,
    Bool,
    Principal,
    Buffer { max_len: u32 },
    StringAscii { max_len: u32 },
    StringUtf8 { max_len: u32 },
    Optional(Box<TypeDescriptor>),
    Response {
        ok: Box<TypeDescriptor>,
        err: Box<TypeDescriptor>,
    },
    Tuple(Vec<TupleField>),
    List {
        inner: Box<TypeDescriptor>,
        max_len: u32,
    },
    /// The ABI's placeholder for a type that can never hold a value, e.g. the
    /// error side of `(response bool none)`.
    NoType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleField {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    pub fn response(ok: TypeDescriptor, err: TypeDescriptor) -> Self {
        TypeDescriptor::Response {
            ok: Box::new(ok),
            err: Box::new(err),
        }
    }

    pub fn list(inner: TypeDescriptor, max_len: u32) -> Self {
        TypeDescriptor::List {
            inner: Box::new(inner),
            max_len,
        }
    }

    pub fn tuple<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        TypeDescriptor::Tuple(
            fields
                .into_iter()
                .map(|(name, ty)| TupleField {
                    name: name.into(),
                    ty,
                })
                .collect(),
        )
    }

    /// Tuples and lists take JSON input; everything else takes a literal.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeDescriptor::Tuple(_) | TypeDescriptor::List { .. })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::UInt => write!(f, "uint"),
            TypeDescriptor::Int => write!(f, "int"),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Principal => write!(f, "principal"),
            TypeDescriptor::Buffer { max_len } => write!(f, "(buff {})", max_len),
            TypeDescriptor::StringAscii { max_len } => write!(f, "(string-ascii {})", max_len),
            TypeDescriptor::StringUtf8 { max_len } => write!(f, "(string-utf8 {})", max_len),
            TypeDescriptor::Optional(inner) => write!(f, "(optional {})", inner),
            TypeDescriptor::Response { ok, err } => write!(f, "(response {} {})", ok, err),
            TypeDescriptor::Tuple(fields) => {
                write!(f, "(tuple")?;
                for field in fields {
                    write!(f, " ({} {})", field.name, field.ty)?;
                }
                write!(f, ")")
            }
            TypeDescriptor::List { inner, max_len } => write!(f, "(list {} {})", max_len, inner),
            TypeDescriptor::NoType => write!(f, "none"),
        }
    }
}

/// Wire shape of a type in the contract-interface JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAbiType {
    Name(String),
    Composite(RawCompositeType),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawCompositeType {
    Buffer {
        length: u32,
    },
    StringAscii {
        length: u32,
    },
    StringUtf8 {
        length: u32,
    },
    Optional(Box<RawAbiType>),
    Response {
        ok: Box<RawAbiType>,
        error: Box<RawAbiType>,
    },
    Tuple(Vec<RawTupleField>),
    List {
        #[serde(rename = "type")]
        element: Box<RawAbiType>,
        length: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTupleField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: RawAbiType,
}

impl TryFrom<RawAbiType> for TypeDescriptor {
    type Error = String;

    fn try_from(raw: RawAbiType) -> Result<Self, Self::Error> {
        match raw {
            RawAbiType::Name(name) => match name.as_str() {
                "uint128" => Ok(TypeDescriptor::UInt),
                "int128" => Ok(TypeDescriptor::Int),
                "bool" => Ok(TypeDescriptor::Bool),
                // Trait references travel as contract principals.
                "principal" | "trait_reference" => Ok(TypeDescriptor::Principal),
                "none" => Ok(TypeDescriptor::NoType),
                other => Err(format!("unsupported ABI type \"{}\"", other)),
            },
            RawAbiType::Composite(composite) => match composite {
                RawCompositeType::Buffer { length } => Ok(TypeDescriptor::Buffer { max_len: length }),
                RawCompositeType::StringAscii { length } => {
                    Ok(TypeDescriptor::StringAscii { max_len: length })
                }
                RawCompositeType::StringUtf8 { length } => {
                    Ok(TypeDescriptor::StringUtf8 { max_len: length })
                }
                RawCompositeType::Optional(inner) => {
                    Ok(TypeDescriptor::optional(TypeDescriptor::try_from(*inner)?))
                }
                RawCompositeType::Response { ok, error } => Ok(TypeDescriptor::response(
                    TypeDescriptor::try_from(*ok)?,
                    TypeDescriptor::try_from(*error)?,
                )),
                RawCompositeType::Tuple(fields) => {
                    let mut parsed = Vec::with_capacity(fields.len());
                    for field in fields {
                        if parsed.iter().any(|f: &TupleField| f.name == field.name) {
                            return Err(format!("duplicate tuple field \"{}\"", field.name));
                        }
                        parsed.push(TupleField {
                            name: field.name,
                            ty: TypeDescriptor::try_from(field.field_type)?,
                        });
                    }
                    Ok(TypeDescriptor::Tuple(parsed))
                }
                RawCompositeType::List { element, length } => Ok(TypeDescriptor::list(
                    TypeDescriptor::try_from(*element)?,
                    length,
                )),
            },
        }
    }
}

impl From<TypeDescriptor> for RawAbiType {
    fn from(ty: TypeDescriptor) -> Self {
        match ty {
            TypeDescriptor::UInt => RawAbiType::Name("uint128".to_string()),
            TypeDescriptor::Int => RawAbiType::Name("int128".to_string()),
            TypeDescriptor::Bool => RawAbiType::Name("bool".to_string()),
            TypeDescriptor::Principal => RawAbiType::Name("principal".to_string()),
            TypeDescriptor::NoType => RawAbiType::Name("none".to_string()),
            TypeDescriptor::Buffer { max_len } => {
                RawAbiType::Composite(RawCompositeType::Buffer { length: max_len })
            }
            TypeDescriptor::StringAscii { max_len } => {
                RawAbiType::Composite(RawCompositeType::StringAscii { length: max_len })
            }
            TypeDescriptor::StringUtf8 { max_len } => {
                RawAbiType::Composite(RawCompositeType::StringUtf8 { length: max_len })
            }
            TypeDescriptor::Optional(inner) => {
                RawAbiType::Composite(RawCompositeType::Optional(Box::new((*inner).into())))
            }
            TypeDescriptor::Response { ok, err } => RawAbiType::Composite(RawCompositeType::Response {
                ok: Box::new((*ok).into()),
                error: Box::new((*err).into()),
            }),
            TypeDescriptor::Tuple(fields) => RawAbiType::Composite(RawCompositeType::Tuple(
                fields
                    .into_iter()
                    .map(|f| RawTupleField {
                        name: f.name,
                        field_type: f.ty.into(),
                    })
                    .collect(),
            )),
            TypeDescriptor::List { inner, max_len } => RawAbiType::Composite(RawCompositeType::List {
                element: Box::new((*inner).into()),
                length: max_len,
            }),
        }
    }
}
