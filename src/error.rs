//! Graph Construction Errors
//!
//! Every failure raised while declaring types, tools and workflow graphs.
//! All variants except [`GraphError::InvalidGraph`] are construction-time
//! errors raised by the exact call that introduced the problem.

use std::fmt;

use thiserror::Error;

/// Namespace a declared name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Type,
    Tool,
    Input,
    Step,
    Output,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Type => "type",
            Self::Tool => "tool",
            Self::Input => "input",
            Self::Step => "step",
            Self::Output => "output",
        };
        f.write_str(label)
    }
}

/// Errors raised by the type registry, tool catalog, graph builder and translator.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Unknown data type '{name}'")]
    UnknownType { name: String },

    #[error("Malformed type expression '{expr}'")]
    TypeSyntax { expr: String },

    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: NameKind, name: String },

    #[error("Invalid {kind} name '{name}': expected letters, digits or '_' not starting with a digit")]
    InvalidName { kind: NameKind, name: String },

    #[error("Unknown tool '{tool}'{}", version_suffix(.version))]
    UnknownTool {
        tool: String,
        version: Option<String>,
    },

    #[error("Step '{step}': tool '{tool}' has no input named '{input}'")]
    UnknownInput {
        step: String,
        tool: String,
        input: String,
    },

    #[error("{site}: reference '{reference}' does not resolve to a declared input or step output")]
    UnresolvedReference { site: String, reference: String },

    #[error("Step '{step}': input '{input}' expects {expected} but was bound to {actual}")]
    TypeMismatch {
        step: String,
        input: String,
        expected: String,
        actual: String,
    },

    #[error("Step '{step}': required input '{input}' of tool '{tool}' is not bound and has no default")]
    MissingRequiredInput {
        step: String,
        tool: String,
        input: String,
    },

    #[error("Workflow '{workflow}' is incomplete: {reason}")]
    IncompleteGraph { workflow: String, reason: String },

    #[error("Workflow '{workflow}' is frozen; cannot {operation}")]
    Frozen { workflow: String, operation: String },

    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// True for translator-side invariant violations, which indicate a bug
    /// in whatever produced the graph rather than a user mistake.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InvalidGraph(_))
    }
}

fn version_suffix(version: &Option<String>) -> String {
    match version {
        Some(v) => format!(" (version {})", v),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Checks that a declared name is a usable identifier.
pub(crate) fn check_name(kind: NameKind, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(GraphError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}
