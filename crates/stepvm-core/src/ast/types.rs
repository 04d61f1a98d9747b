//! Type references, names and modifiers.
//!
//! These nodes appear in declaration positions only. They carry no behavior
//! beyond the comparisons the desugaring passes need: canonical type spelling
//! for signature matching and decoded modifier flags for visibility checks.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A bare identifier in a declaration position (`name` fields).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleName {
    pub identifier: String,
}

impl SimpleName {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for SimpleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// A type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum Type {
    /// `int`, `boolean`, `void`, ...
    PrimitiveType {
        #[serde(rename = "primitiveTypeCode")]
        primitive_type_code: String,
    },
    /// A named class type such as `String` or `Base`.
    SimpleType { name: SimpleName },
    /// `T[]`, `T[][]`, ...
    ArrayType {
        #[serde(rename = "elementType")]
        element_type: Box<Type>,
        #[serde(default = "one")]
        dimensions: u32,
    },
}

fn one() -> u32 {
    1
}

impl Type {
    pub fn primitive(code: impl Into<String>) -> Self {
        Type::PrimitiveType {
            primitive_type_code: code.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::SimpleType {
            name: SimpleName::new(name),
        }
    }

    /// Whether this is the `void` pseudo-type.
    pub fn is_void(&self) -> bool {
        matches!(self, Type::PrimitiveType { primitive_type_code } if primitive_type_code == "void")
    }
}

/// Canonical spelling used for exact signature comparison.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::PrimitiveType {
                primitive_type_code,
            } => f.write_str(primitive_type_code),
            Type::SimpleType { name } => write!(f, "{name}"),
            Type::ArrayType {
                element_type,
                dimensions,
            } => {
                write!(f, "{element_type}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

/// An entry of a `modifiers` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum Modifier {
    /// A keyword modifier (`public`, `static`, `final`, ...).
    Modifier { keyword: String },
    /// An annotation without arguments, e.g. `@Override`.
    MarkerAnnotation {
        #[serde(rename = "typeName")]
        type_name: SimpleName,
    },
}

impl Modifier {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Modifier::Modifier {
            keyword: keyword.into(),
        }
    }
}

bitflags! {
    /// Decoded keyword modifiers of a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const SYNCHRONIZED = 1 << 6;
        const NATIVE = 1 << 7;
        const TRANSIENT = 1 << 8;
        const VOLATILE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;
    }
}

impl Modifiers {
    /// Decode a `modifiers` list. Annotations and unknown keywords are ignored.
    pub fn from_list(list: &[Modifier]) -> Self {
        list.iter()
            .filter_map(|m| match m {
                Modifier::Modifier { keyword } => Self::from_keyword(keyword),
                Modifier::MarkerAnnotation { .. } => None,
            })
            .fold(Modifiers::empty(), |acc, flag| acc | flag)
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "public" => Modifiers::PUBLIC,
            "protected" => Modifiers::PROTECTED,
            "private" => Modifiers::PRIVATE,
            "static" => Modifiers::STATIC,
            "final" => Modifiers::FINAL,
            "abstract" => Modifiers::ABSTRACT,
            "synchronized" => Modifiers::SYNCHRONIZED,
            "native" => Modifiers::NATIVE,
            "transient" => Modifiers::TRANSIENT,
            "volatile" => Modifiers::VOLATILE,
            "strictfp" => Modifiers::STRICTFP,
            "default" => Modifiers::DEFAULT,
            _ => return None,
        };
        Some(flag)
    }

    pub fn visibility(self) -> Visibility {
        if self.contains(Modifiers::PUBLIC) {
            Visibility::Public
        } else if self.contains(Modifiers::PROTECTED) {
            Visibility::Protected
        } else if self.contains(Modifiers::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    Public,
    Protected,
    /// No visibility keyword.
    #[default]
    Package,
    Private,
}

impl Visibility {
    /// The keyword modifier spelling this visibility, if it has one.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Protected => Some("protected"),
            Visibility::Private => Some("private"),
            Visibility::Package => None,
        }
    }
}
