use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast;
use serde::Serialize;

/// A reference to a named type, with its nullability and list wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Named(Name),
    NonNullNamed(Name),
    List(Box<TypeRef>),
    NonNullList(Box<TypeRef>),
}

impl TypeRef {
    /// The named type at the bottom of all wrappers.
    pub fn inner_named_type(&self) -> &Name {
        match self {
            Self::Named(name) | Self::NonNullNamed(name) => name,
            Self::List(item) | Self::NonNullList(item) => item.inner_named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNullNamed(_) | Self::NonNullList(_))
    }
}

impl From<&ast::Type> for TypeRef {
    fn from(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => Self::Named(name.clone()),
            ast::Type::NonNullNamed(name) => Self::NonNullNamed(name.clone()),
            ast::Type::List(item) => Self::List(Box::new(Self::from(&**item))),
            ast::Type::NonNullList(item) => Self::NonNullList(Box::new(Self::from(&**item))),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::NonNullNamed(name) => write!(f, "{name}!"),
            Self::List(item) => write!(f, "[{item}]"),
            Self::NonNullList(item) => write!(f, "[{item}]!"),
        }
    }
}
