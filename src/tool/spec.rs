//! Tool Contract
//!
//! The schema every invocable tool exposes: named, typed inputs and
//! outputs plus identity and container metadata. The workflow core
//! never looks further into a tool than this.
//!
//! # Example YAML Format
//!
//! ```yaml
//! - id: Gatk4SortSam
//!   version: 4.1.4.0
//!   container: broadinstitute/gatk:4.1.4.0
//!   base_command: [gatk, SortSam]
//!   inputs:
//!     bam:
//!       type: Bam
//!       prefix: -I
//!     sortOrder:
//!       type: String
//!       prefix: --SORT_ORDER
//!   outputs:
//!     out:
//!       type: IndexedBam
//!       glob: sorted.bam
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{check_name, GraphError, NameKind, Result};
use crate::types::{DataType, Literal};

/// Declaration of a single tool input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolInput {
    /// Declared data type
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Whether a step must provide a value (directly or via `default`)
    #[serde(default = "default_required")]
    pub required: bool,

    /// Value used when a step leaves this input unbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,

    /// Command-line flag preceding the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Position on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

fn default_required() -> bool {
    true
}

impl ToolInput {
    /// Creates a required input of the given type.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            required: true,
            default: None,
            prefix: None,
            position: None,
            doc: None,
        }
    }

    /// Marks the input as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Literal>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the command-line prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the command-line position.
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }
}

/// Declaration of a single tool output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolOutput {
    /// Declared data type
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// File pattern collected after the tool runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl ToolOutput {
    /// Creates an output of the given type.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            glob: None,
            doc: None,
        }
    }

    /// Sets the collection glob.
    pub fn with_glob(mut self, glob: impl Into<String>) -> Self {
        self.glob = Some(glob.into());
        self
    }
}

/// An invocable tool: identity, version and port schema.
///
/// Owned by the tool catalog and shared with steps by reference.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    /// Tool identifier (e.g. "BwaMem")
    pub id: String,

    /// Tool version (e.g. "0.7.17")
    pub version: String,

    /// Container image the tool runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Executable and fixed leading arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_command: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    /// Inputs in declaration order
    #[serde(default)]
    pub inputs: IndexMap<String, ToolInput>,

    /// Outputs in declaration order
    #[serde(default)]
    pub outputs: IndexMap<String, ToolOutput>,
}

impl ToolSpec {
    /// Creates a tool with no ports.
    ///
    /// # Example
    ///
    /// ```
    /// use pipeweaver::tool::{ToolInput, ToolOutput, ToolSpec};
    /// use pipeweaver::types::DataType;
    ///
    /// let tool = ToolSpec::new("SamToolsView", "1.9")
    ///     .with_container("biocontainers/samtools:v1.9-4-deb_cv1")
    ///     .with_input("sam", ToolInput::new(DataType::named("Sam")))
    ///     .with_output("out", ToolOutput::new(DataType::named("Bam")));
    ///
    /// assert_eq!(tool.key(), "SamToolsView_1.9");
    /// ```
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            version: version.into().trim().to_string(),
            container: None,
            base_command: Vec::new(),
            doc: None,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Sets the container image.
    pub fn with_container(mut self, image: impl Into<String>) -> Self {
        self.container = Some(image.into());
        self
    }

    /// Sets the base command.
    pub fn with_base_command<S: Into<String>>(mut self, command: Vec<S>) -> Self {
        self.base_command = command.into_iter().map(Into::into).collect();
        self
    }

    /// Appends an input port.
    pub fn with_input(mut self, name: impl Into<String>, input: ToolInput) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }

    /// Appends an output port.
    pub fn with_output(mut self, name: impl Into<String>, output: ToolOutput) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Identity used to deduplicate tools: `<id>_<version>`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.id, self.version)
    }

    /// Checks that `id` is an identifier and `version` is a non-empty
    /// token without `_` or whitespace, so distinct tools never share a
    /// [`key`](Self::key).
    pub fn check_identity(&self) -> Result<()> {
        check_name(NameKind::Tool, &self.id)?;

        let version_ok = !self.version.is_empty()
            && !self
                .version
                .chars()
                .any(|c| c == '_' || c.is_whitespace() || c.is_control());
        if !version_ok {
            return Err(GraphError::InvalidName {
                kind: NameKind::Tool,
                name: self.key(),
            });
        }
        Ok(())
    }

    /// Looks up an input declaration.
    pub fn input(&self, name: &str) -> Option<&ToolInput> {
        self.inputs.get(name)
    }

    /// Looks up an output declaration.
    pub fn output(&self, name: &str) -> Option<&ToolOutput> {
        self.outputs.get(name)
    }
}
