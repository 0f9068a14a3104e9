//! Workflow Data Model
//!
//! The frozen workflow graph and its parts. A [`WorkflowGraph`] is only
//! produced by [`WorkflowBuilder::freeze`](super::builder::WorkflowBuilder::freeze)
//! and is never mutated afterwards.
//!
//! # Structure
//!
//! ```text
//! inputs:  reads: FastqGzPairedEnd, reference: FastaWithIndexes
//! steps:   bwamem (BwaMem)        reads <- inputs.reads
//!          samtoolsview (View)    sam   <- steps.bwamem/out
//! outputs: out_bam <- steps.samtoolsview/out
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use super::port::{Binding, PortRef};
use crate::tool::ToolSpec;
use crate::types::{DataType, TypeRegistry};

/// A declared workflow input.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInput {
    /// Declared data type
    pub data_type: DataType,
    /// Human-readable description
    pub doc: Option<String>,
}

/// A declared workflow output.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutput {
    /// Port the output value is taken from
    pub source: PortRef,
    /// Type of the source port
    pub data_type: DataType,
}

/// One instantiation of a tool inside a workflow.
#[derive(Debug, Clone)]
pub struct StepNode {
    /// Unique step identifier
    pub id: String,

    /// Tool this step runs; shared with the catalog
    pub tool: Arc<ToolSpec>,

    /// Tool input name -> bound source. Tool defaults for unbound
    /// inputs are already materialised here as literals.
    pub bindings: BTreeMap<String, Binding>,
}

impl StepNode {
    /// Ids of the steps whose outputs this step consumes.
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.port_bindings()
            .filter_map(|(_, port)| port.step_id())
            .collect()
    }

    /// Bindings that point at ports, in input-name order.
    pub fn port_bindings(&self) -> impl Iterator<Item = (&str, &PortRef)> {
        self.bindings.iter().filter_map(|(name, binding)| match binding {
            Binding::Port(port) => Some((name.as_str(), port)),
            Binding::Literal(_) => None,
        })
    }

    /// Returns true if the step reads no other step's output.
    pub fn is_root(&self) -> bool {
        self.dependencies().is_empty()
    }
}

/// A frozen, validated workflow graph.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    name: String,
    types: Arc<TypeRegistry>,
    inputs: IndexMap<String, WorkflowInput>,
    steps: Vec<StepNode>,
    outputs: IndexMap<String, WorkflowOutput>,
}

impl WorkflowGraph {
    pub(crate) fn from_parts(
        name: String,
        types: Arc<TypeRegistry>,
        inputs: IndexMap<String, WorkflowInput>,
        steps: Vec<StepNode>,
        outputs: IndexMap<String, WorkflowOutput>,
    ) -> Self {
        Self {
            name,
            types,
            inputs,
            steps,
            outputs,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type registry the graph was checked against.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Declared inputs in declaration order.
    pub fn inputs(&self) -> &IndexMap<String, WorkflowInput> {
        &self.inputs
    }

    /// Steps in declaration order, which is also a valid execution order.
    pub fn steps(&self) -> &[StepNode] {
        &self.steps
    }

    /// Declared outputs in declaration order.
    pub fn outputs(&self) -> &IndexMap<String, WorkflowOutput> {
        &self.outputs
    }

    /// Gets a step by ID.
    pub fn step(&self, id: &str) -> Option<&StepNode> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of a step in declaration order.
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Resolves the data type carried by a port, if the port exists.
    pub fn port_type(&self, port: &PortRef) -> Option<&DataType> {
        match port {
            PortRef::WorkflowInput(name) => self.inputs.get(name).map(|i| &i.data_type),
            PortRef::StepOutput { step, output } => self
                .step(step)
                .and_then(|s| s.tool.output(output))
                .map(|o| &o.data_type),
        }
    }

    /// Distinct tools in order of first use; a tool shared by several
    /// steps appears once.
    pub fn tools(&self) -> Vec<Arc<ToolSpec>> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .filter(|step| seen.insert((step.tool.id.as_str(), step.tool.version.as_str())))
            .map(|step| Arc::clone(&step.tool))
            .collect()
    }

    /// Returns steps with no dependencies (entry points).
    pub fn root_steps(&self) -> Vec<&StepNode> {
        self.steps.iter().filter(|s| s.is_root()).collect()
    }

    /// Returns steps no other step consumes (exit points).
    pub fn leaf_steps(&self) -> Vec<&StepNode> {
        let consumed: HashSet<&str> = self
            .steps
            .iter()
            .flat_map(|s| s.dependencies())
            .collect();
        self.steps
            .iter()
            .filter(|s| !consumed.contains(s.id.as_str()))
            .collect()
    }

    /// Returns the number of steps in the workflow.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
