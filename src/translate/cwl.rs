//! CWL Translator
//!
//! Converts a frozen [`WorkflowGraph`] into an all-in-one [`Document`]:
//! the workflow itself plus every distinct tool it uses.
//!
//! The builder only accepts references to earlier declarations, so the
//! declaration order of steps is already a valid execution order and is
//! emitted as is. The translator still re-validates the graph and checks
//! that order before emitting anything; a failure there is reported as
//! `InvalidGraph`.

use std::collections::BTreeMap;

use log::{debug, info};

use super::document::{
    Document, InputBinding, InputParameter, OutputBinding, OutputParameter, Requirement,
    StepDocument, StepInput, ToolDocument, ToolInputParameter, ToolOutputParameter,
};
use crate::error::{GraphError, Result};
use crate::tool::ToolSpec;
use crate::types::{DataType, TypeRegistry};
use crate::workflow::validator::{topological_order, validate_graph};
use crate::workflow::{Binding, WorkflowGraph};

/// CWL version written when none is configured.
pub const DEFAULT_CWL_VERSION: &str = "v1.2";

/// Translates workflow graphs into CWL-style documents.
#[derive(Debug, Clone)]
pub struct CwlTranslator {
    cwl_version: String,
}

impl CwlTranslator {
    /// Creates a translator targeting [`DEFAULT_CWL_VERSION`].
    pub fn new() -> Self {
        Self {
            cwl_version: DEFAULT_CWL_VERSION.to_string(),
        }
    }

    /// Overrides the CWL version written to the document.
    pub fn with_cwl_version(mut self, version: impl Into<String>) -> Self {
        self.cwl_version = version.into();
        self
    }

    /// Translates a frozen graph.
    ///
    /// Pure function of the graph: identical graphs always produce
    /// identical documents.
    pub fn translate(&self, graph: &WorkflowGraph) -> Result<Document> {
        validate_graph(graph)?;

        let order = topological_order(graph)?;
        if order.iter().enumerate().any(|(position, &index)| position != index) {
            return Err(GraphError::InvalidGraph(format!(
                "declaration order of workflow '{}' is not an execution order",
                graph.name()
            )));
        }

        let types = graph.types();

        let inputs = graph
            .inputs()
            .iter()
            .map(|(name, input)| {
                Ok(InputParameter {
                    name: name.clone(),
                    cwl_type: cwl_type(types, &input.data_type, false)?,
                    data_type: input.data_type.to_string(),
                    secondary_files: secondary_files(types, &input.data_type),
                    doc: input.doc.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let steps = graph
            .steps()
            .iter()
            .map(|step| {
                let inputs: BTreeMap<String, StepInput> = step
                    .bindings
                    .iter()
                    .map(|(name, binding)| {
                        let input = match binding {
                            Binding::Port(port) => StepInput::Source(port.to_string()),
                            Binding::Literal(literal) => StepInput::Default {
                                default: literal.clone(),
                            },
                        };
                        (name.clone(), input)
                    })
                    .collect();

                StepDocument {
                    id: step.id.clone(),
                    tool: step.tool.key(),
                    inputs,
                    out: step.tool.outputs.keys().cloned().collect(),
                }
            })
            .collect();

        let outputs = graph
            .outputs()
            .iter()
            .map(|(name, output)| {
                Ok(OutputParameter {
                    name: name.clone(),
                    cwl_type: cwl_type(types, &output.data_type, false)?,
                    data_type: output.data_type.to_string(),
                    source: output.source.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tools = graph
            .tools()
            .iter()
            .map(|tool| tool_document(types, tool))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Translated workflow '{}': {} steps, {} embedded tools",
            graph.name(),
            graph.len(),
            tools.len()
        );

        Ok(Document {
            cwl_version: self.cwl_version.clone(),
            class: "Workflow".to_string(),
            id: graph.name().to_string(),
            inputs,
            steps,
            outputs,
            tools,
        })
    }
}

impl Default for CwlTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates a graph with the default translator settings.
pub fn translate(graph: &WorkflowGraph) -> Result<Document> {
    CwlTranslator::new().translate(graph)
}

fn tool_document(types: &TypeRegistry, tool: &ToolSpec) -> Result<ToolDocument> {
    debug!("Embedding tool '{}'", tool.key());

    let inputs = tool
        .inputs
        .iter()
        .map(|(name, input)| {
            let input_binding = if input.prefix.is_some() || input.position.is_some() {
                Some(InputBinding {
                    prefix: input.prefix.clone(),
                    position: input.position,
                })
            } else {
                None
            };

            Ok(ToolInputParameter {
                name: name.clone(),
                cwl_type: cwl_type(types, &input.data_type, !input.required)?,
                data_type: input.data_type.to_string(),
                secondary_files: secondary_files(types, &input.data_type),
                input_binding,
                doc: input.doc.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let outputs = tool
        .outputs
        .iter()
        .map(|(name, output)| {
            Ok(ToolOutputParameter {
                name: name.clone(),
                cwl_type: cwl_type(types, &output.data_type, false)?,
                data_type: output.data_type.to_string(),
                secondary_files: secondary_files(types, &output.data_type),
                output_binding: output
                    .glob
                    .as_ref()
                    .map(|glob| OutputBinding { glob: glob.clone() }),
                doc: output.doc.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let requirements = tool
        .container
        .iter()
        .map(|image| Requirement::DockerRequirement {
            docker_pull: image.clone(),
        })
        .collect();

    Ok(ToolDocument {
        id: tool.key(),
        class: "CommandLineTool".to_string(),
        label: tool.id.clone(),
        version: tool.version.clone(),
        base_command: tool.base_command.clone(),
        requirements,
        inputs,
        outputs,
        doc: tool.doc.clone(),
    })
}

/// Portable type name: the root primitive, `[]` per array layer, `?` when optional.
fn cwl_type(types: &TypeRegistry, ty: &DataType, optional: bool) -> Result<String> {
    let base = match ty {
        DataType::Named(name) => types
            .primitive_of(name)
            .map(|p| p.cwl_name().to_string())
            .ok_or_else(|| {
                GraphError::InvalidGraph(format!("type '{}' is not registered", name))
            })?,
        DataType::Array(item) => format!("{}[]", cwl_type(types, item, false)?),
    };

    Ok(if optional { format!("{}?", base) } else { base })
}

fn secondary_files(types: &TypeRegistry, ty: &DataType) -> Vec<String> {
    types.secondary_files(ty.base_name()).to_vec()
}
