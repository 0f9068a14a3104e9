//! Literal Values
//!
//! Constants bound directly to tool inputs (e.g. `sortOrder: coordinate`,
//! `markShorterSplits: true`) and tool-declared defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value bound to a tool input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl Literal {
    /// Short name of the literal's kind, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::List(_) => "List",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars_pick_the_right_kind() {
        let value: Literal = serde_yaml::from_str("coordinate").unwrap();
        assert_eq!(value, Literal::from("coordinate"));

        let value: Literal = serde_yaml::from_str("true").unwrap();
        assert_eq!(value, Literal::Boolean(true));

        let value: Literal = serde_yaml::from_str("42").unwrap();
        assert_eq!(value, Literal::Int(42));

        let value: Literal = serde_yaml::from_str("0.5").unwrap();
        assert_eq!(value, Literal::Float(0.5));

        let value: Literal = serde_yaml::from_str("[1, 2]").unwrap();
        assert_eq!(value, Literal::from(vec![1i64, 2]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Literal::from("queryname").to_string(), "\"queryname\"");
        assert_eq!(Literal::from(vec![true, false]).to_string(), "[true, false]");
    }

    #[test]
    fn test_kind() {
        assert_eq!(Literal::from(3).kind(), "Int");
        assert_eq!(Literal::from(vec!["a"]).kind(), "List");
    }
}
