//! Type Expressions
//!
//! A [`DataType`] names a registered type, optionally wrapped in one or
//! more array layers. The textual form is used in definition files and
//! error messages:
//!
//! ```text
//! Bam            -> Named("Bam")
//! VcfTabix[]     -> Array(Named("VcfTabix"))
//! Array(String)  -> Array(Named("String"))
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A data-type expression. Immutable value; compared structurally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    /// A registered type referenced by name
    Named(String),
    /// Array whose elements are of the inner type
    Array(Box<DataType>),
}

impl DataType {
    /// Creates a reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a type in an array layer.
    pub fn array_of(item: DataType) -> Self {
        Self::Array(Box::new(item))
    }

    /// Returns true if this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns the element type of an array, or `None` for named types.
    pub fn item(&self) -> Option<&DataType> {
        match self {
            Self::Array(item) => Some(item),
            Self::Named(_) => None,
        }
    }

    /// Name of the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Array(item) => item.base_name(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::Array(item) => write!(f, "{}[]", item),
        }
    }
}

fn parse_expr(expr: &str) -> Option<DataType> {
    let expr = expr.trim();

    if let Some(inner) = expr.strip_suffix("[]") {
        return parse_expr(inner).map(DataType::array_of);
    }

    if let Some(rest) = expr.strip_prefix("Array(") {
        let inner = rest.strip_suffix(')')?;
        return parse_expr(inner).map(DataType::array_of);
    }

    let mut chars = expr.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(DataType::Named(expr.to_string()))
    } else {
        None
    }
}

impl FromStr for DataType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expr(s).ok_or_else(|| GraphError::TypeSyntax {
            expr: s.to_string(),
        })
    }
}

impl TryFrom<String> for DataType {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string()
    }
}
