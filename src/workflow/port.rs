//! Port References and Bindings
//!
//! A [`PortRef`] names a value flowing through the graph without
//! resolving it: either a workflow input or one output of a step.
//! A [`Binding`] is what a step input is wired to: a port or a literal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::types::Literal;

/// Reference to a workflow input or a step output.
///
/// Textual form: `inputs.<name>` or `steps.<step>/<output>`. Parsing
/// also accepts the short forms `<name>` and `<step>/<output>`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub enum PortRef {
    WorkflowInput(String),
    StepOutput { step: String, output: String },
}

impl PortRef {
    /// References a workflow input.
    pub fn input(name: impl Into<String>) -> Self {
        Self::WorkflowInput(name.into())
    }

    /// References an output of a step.
    pub fn step_output(step: impl Into<String>, output: impl Into<String>) -> Self {
        Self::StepOutput {
            step: step.into(),
            output: output.into(),
        }
    }

    /// Id of the step this port belongs to, if it is a step output.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::StepOutput { step, .. } => Some(step),
            Self::WorkflowInput(_) => None,
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkflowInput(name) => write!(f, "inputs.{}", name),
            Self::StepOutput { step, output } => write!(f, "steps.{}/{}", step, output),
        }
    }
}

impl FromStr for PortRef {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || GraphError::UnresolvedReference {
            site: "Port reference".to_string(),
            reference: s.to_string(),
        };

        let port = if let Some(rest) = text.strip_prefix("steps.") {
            let (step, output) = rest.split_once('/').ok_or_else(invalid)?;
            Self::step_output(step, output)
        } else if let Some(name) = text.strip_prefix("inputs.") {
            Self::input(name)
        } else if let Some((step, output)) = text.split_once('/') {
            Self::step_output(step, output)
        } else {
            Self::input(text)
        };

        let parts_ok = match &port {
            Self::WorkflowInput(name) => !name.is_empty() && !name.contains('/'),
            Self::StepOutput { step, output } => {
                !step.is_empty() && !output.is_empty() && !output.contains('/')
            }
        };

        if parts_ok {
            Ok(port)
        } else {
            Err(invalid())
        }
    }
}

impl TryFrom<String> for PortRef {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortRef> for String {
    fn from(value: PortRef) -> Self {
        value.to_string()
    }
}

/// Source wired into a step input.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Port(PortRef),
    Literal(Literal),
}

impl From<PortRef> for Binding {
    fn from(port: PortRef) -> Self {
        Self::Port(port)
    }
}

impl From<&PortRef> for Binding {
    fn from(port: &PortRef) -> Self {
        Self::Port(port.clone())
    }
}

impl From<Literal> for Binding {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for Binding {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i64> for Binding {
    fn from(value: i64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i32> for Binding {
    fn from(value: i32) -> Self {
        Self::Literal(value.into())
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Self::Literal(value.into())
    }
}
