//! Translated Document Model
//!
//! Serializable shape of a translated workflow. Field order is fixed by
//! the struct definitions and every map is ordered, so identical graphs
//! always serialize to identical bytes.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "cwlVersion": "v1.2",
//!   "class": "Workflow",
//!   "id": "variantcaller",
//!   "inputs": [{ "name": "reads", "type": "File", "data_type": "FastqGzPairedEnd" }],
//!   "steps": [{ "id": "bwamem", "tool": "BwaMem_0.7.17",
//!               "in": { "reads": "inputs.reads" }, "out": ["out"] }],
//!   "outputs": [{ "name": "sam", "type": "File", "data_type": "Sam",
//!                 "source": "steps.bwamem/out" }],
//!   "tools": [{ "id": "BwaMem_0.7.17", "class": "CommandLineTool", ... }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Literal;

/// A translated workflow with every tool it uses embedded once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    #[serde(rename = "cwlVersion")]
    pub cwl_version: String,

    /// Always "Workflow"
    pub class: String,

    /// Workflow name
    pub id: String,

    pub inputs: Vec<InputParameter>,

    /// Steps in execution order
    pub steps: Vec<StepDocument>,

    pub outputs: Vec<OutputParameter>,

    /// One entry per distinct tool, in order of first use
    pub tools: Vec<ToolDocument>,
}

impl Document {
    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serializes the document as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Step ids in emitted order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Looks up an embedded tool by its key.
    pub fn tool(&self, key: &str) -> Option<&ToolDocument> {
        self.tools.iter().find(|t| t.id == key)
    }
}

/// A workflow input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputParameter {
    pub name: String,

    /// Portable type (e.g. "File", "string[]")
    #[serde(rename = "type")]
    pub cwl_type: String,

    /// Registered type the input was declared with
    pub data_type: String,

    #[serde(rename = "secondaryFiles", default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Source of a step input: a port reference or a constant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StepInput {
    /// `inputs.<name>` or `steps.<id>/<output>`
    Source(String),
    /// Literal binding or materialised tool default
    Default { default: Literal },
}

/// A workflow step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepDocument {
    pub id: String,

    /// Key of the embedded tool this step runs
    pub tool: String,

    #[serde(rename = "in")]
    pub inputs: BTreeMap<String, StepInput>,

    /// Output names in the tool's declaration order
    pub out: Vec<String>,
}

/// A workflow output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub cwl_type: String,

    pub data_type: String,

    /// `inputs.<name>` or `steps.<id>/<output>`
    pub source: String,
}

/// Runtime requirement attached to an embedded tool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "class")]
pub enum Requirement {
    DockerRequirement {
        #[serde(rename = "dockerPull")]
        docker_pull: String,
    },
}

/// Command-line placement of a tool input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

/// Collection rule of a tool output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputBinding {
    pub glob: String,
}

/// An embedded tool input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolInputParameter {
    pub name: String,

    /// Portable type, suffixed with `?` when optional
    #[serde(rename = "type")]
    pub cwl_type: String,

    pub data_type: String,

    #[serde(rename = "secondaryFiles", default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<String>,

    #[serde(rename = "inputBinding", default, skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<InputBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// An embedded tool output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolOutputParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub cwl_type: String,

    pub data_type: String,

    #[serde(rename = "secondaryFiles", default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<String>,

    #[serde(rename = "outputBinding", default, skip_serializing_if = "Option::is_none")]
    pub output_binding: Option<OutputBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// An embedded tool definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDocument {
    /// `<tool id>_<version>`
    pub id: String,

    /// Always "CommandLineTool"
    pub class: String,

    /// Tool id without version
    pub label: String,

    pub version: String,

    #[serde(rename = "baseCommand", default, skip_serializing_if = "Vec::is_empty")]
    pub base_command: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    pub inputs: Vec<ToolInputParameter>,

    pub outputs: Vec<ToolOutputParameter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}
