//! Workflow Graph Builder
//!
//! Accumulates workflow inputs, steps and outputs, validating each
//! declaration as it is made so a mistake is reported by the exact call
//! that introduced it. Steps may only reference inputs and steps that
//! were declared before them, which makes cycles impossible to build.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use pipeweaver::tool::{ToolInput, ToolOutput, ToolSpec};
//! use pipeweaver::types::{DataType, TypeDef, TypeRegistry};
//! use pipeweaver::workflow::WorkflowBuilder;
//!
//! fn main() -> Result<(), pipeweaver::GraphError> {
//!     let types = Arc::new(TypeRegistry::from_defs(vec![
//!         TypeDef::new("Sam"),
//!         TypeDef::new("Bam"),
//!     ])?);
//!     let view = Arc::new(
//!         ToolSpec::new("SamToolsView", "1.9")
//!             .with_input("sam", ToolInput::new(DataType::named("Sam")))
//!             .with_output("out", ToolOutput::new(DataType::named("Bam"))),
//!     );
//!
//!     let mut builder = WorkflowBuilder::new("convert", types);
//!     let sam = builder.declare_input("sam", DataType::named("Sam"))?;
//!     let view_step = builder.add_step("samtoolsview", &view, [("sam", &sam)])?;
//!     builder.declare_output("bam", &view_step.output("out")?)?;
//!
//!     let graph = builder.freeze()?;
//!     assert_eq!(graph.len(), 1);
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};

use super::model::{StepNode, WorkflowGraph, WorkflowInput, WorkflowOutput};
use super::port::{Binding, PortRef};
use super::validator::validate_graph;
use crate::error::{check_name, GraphError, NameKind, Result};
use crate::tool::ToolSpec;
use crate::types::{DataType, TypeRegistry};

/// Output ports of a freshly added step, in the tool's declaration order.
#[derive(Debug, Clone)]
pub struct StepOutputs {
    step: String,
    ports: IndexMap<String, PortRef>,
}

impl StepOutputs {
    /// Id of the step these ports belong to.
    pub fn step_id(&self) -> &str {
        &self.step
    }

    /// Port of the named output, if the tool declares it.
    pub fn get(&self, name: &str) -> Option<&PortRef> {
        self.ports.get(name)
    }

    /// Port of the named output, failing with `UnresolvedReference`.
    pub fn output(&self, name: &str) -> Result<PortRef> {
        self.ports
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnresolvedReference {
                site: format!("Step '{}'", self.step),
                reference: PortRef::step_output(&self.step, name).to_string(),
            })
    }

    /// All output ports in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PortRef)> {
        self.ports.iter().map(|(name, port)| (name.as_str(), port))
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Caller-owned builder for a single workflow graph.
///
/// Open for mutation until [`freeze`](Self::freeze) is called; every
/// later mutation fails with `Frozen`.
#[derive(Debug)]
pub struct WorkflowBuilder {
    name: String,
    types: Arc<TypeRegistry>,
    inputs: IndexMap<String, WorkflowInput>,
    steps: Vec<StepNode>,
    step_index: HashMap<String, usize>,
    outputs: IndexMap<String, WorkflowOutput>,
    frozen: Option<Arc<WorkflowGraph>>,
}

impl WorkflowBuilder {
    /// Creates an empty builder checking types against `types`.
    pub fn new(name: impl Into<String>, types: Arc<TypeRegistry>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            types,
            inputs: IndexMap::new(),
            steps: Vec::new(),
            step_index: HashMap::new(),
            outputs: IndexMap::new(),
            frozen: None,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once [`freeze`](Self::freeze) has succeeded.
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Declares a workflow input and returns a reference to it.
    ///
    /// Fails with `DuplicateName` if the name is already used by an
    /// input or a step, and with `UnknownType` for unregistered types.
    pub fn declare_input(&mut self, name: &str, data_type: DataType) -> Result<PortRef> {
        self.declare_input_inner(name, data_type, None)
    }

    /// Declares a documented workflow input.
    pub fn declare_input_with_doc(
        &mut self,
        name: &str,
        data_type: DataType,
        doc: impl Into<String>,
    ) -> Result<PortRef> {
        self.declare_input_inner(name, data_type, Some(doc.into()))
    }

    fn declare_input_inner(
        &mut self,
        name: &str,
        data_type: DataType,
        doc: Option<String>,
    ) -> Result<PortRef> {
        self.ensure_open("declare input")?;
        check_name(NameKind::Input, name)?;

        if self.inputs.contains_key(name) || self.step_index.contains_key(name) {
            return Err(GraphError::DuplicateName {
                kind: NameKind::Input,
                name: name.to_string(),
            });
        }
        self.types.check(&data_type)?;

        debug!("Declared input '{}': {}", name, data_type);
        self.inputs
            .insert(name.to_string(), WorkflowInput { data_type, doc });
        Ok(PortRef::input(name))
    }

    /// Adds a step running `tool` with the given input bindings.
    ///
    /// Checks, in order: the id is new, the tool's types are registered,
    /// every bound name is a tool input, every port resolves to an input
    /// or an already declared step, every binding is type compatible and
    /// every required input is bound or has a default of the right type.
    /// Unbound inputs with a default are bound to that default.
    ///
    /// Returns one port per tool output.
    pub fn add_step<I, K, B>(
        &mut self,
        id: &str,
        tool: &Arc<ToolSpec>,
        bindings: I,
    ) -> Result<StepOutputs>
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<Binding>,
    {
        self.ensure_open("add step")?;
        check_name(NameKind::Step, id)?;

        if self.step_index.contains_key(id) || self.inputs.contains_key(id) {
            return Err(GraphError::DuplicateName {
                kind: NameKind::Step,
                name: id.to_string(),
            });
        }

        tool.check_identity()?;
        self.check_tool_types(tool)?;
        self.check_tool_key(tool)?;

        let mut bound: BTreeMap<String, Binding> = BTreeMap::new();
        for (name, binding) in bindings {
            let name = name.into();
            if bound.contains_key(&name) {
                return Err(GraphError::DuplicateName {
                    kind: NameKind::Input,
                    name,
                });
            }
            bound.insert(name, binding.into());
        }

        for name in bound.keys() {
            if tool.input(name).is_none() {
                return Err(GraphError::UnknownInput {
                    step: id.to_string(),
                    tool: tool.key(),
                    input: name.clone(),
                });
            }
        }

        let mut source_types: BTreeMap<&str, DataType> = BTreeMap::new();
        for (name, binding) in &bound {
            if let Binding::Port(port) = binding {
                let source_ty =
                    self.resolve_port(port)
                        .ok_or_else(|| GraphError::UnresolvedReference {
                            site: format!("Step '{}' input '{}'", id, name),
                            reference: port.to_string(),
                        })?;
                source_types.insert(name.as_str(), source_ty);
            }
        }

        for (name, binding) in &bound {
            let expected = &tool.inputs[name.as_str()].data_type;
            let (accepted, actual) = match binding {
                Binding::Port(_) => {
                    let source_ty = &source_types[name.as_str()];
                    (
                        self.types.compatible(source_ty, expected),
                        source_ty.to_string(),
                    )
                }
                Binding::Literal(literal) => (
                    self.types.accepts_literal(literal, expected),
                    format!("{} literal {}", literal.kind(), literal),
                ),
            };

            if !accepted {
                return Err(GraphError::TypeMismatch {
                    step: id.to_string(),
                    input: name.clone(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        for (name, declared) in &tool.inputs {
            if bound.contains_key(name) {
                continue;
            }
            match &declared.default {
                Some(default) => {
                    if !self.types.accepts_literal(default, &declared.data_type) {
                        return Err(GraphError::TypeMismatch {
                            step: id.to_string(),
                            input: name.clone(),
                            expected: declared.data_type.to_string(),
                            actual: format!("{} literal {} (default)", default.kind(), default),
                        });
                    }
                    debug!("Step '{}': input '{}' defaults to {}", id, name, default);
                    bound.insert(name.clone(), Binding::Literal(default.clone()));
                }
                None if declared.required => {
                    return Err(GraphError::MissingRequiredInput {
                        step: id.to_string(),
                        tool: tool.key(),
                        input: name.clone(),
                    });
                }
                None => {}
            }
        }

        let node = StepNode {
            id: id.to_string(),
            tool: Arc::clone(tool),
            bindings: bound,
        };
        debug!(
            "Added step '{}' ({}) depending on {:?}",
            id,
            tool.key(),
            node.dependencies()
        );

        self.step_index.insert(id.to_string(), self.steps.len());
        self.steps.push(node);

        let ports = tool
            .outputs
            .keys()
            .map(|output| (output.clone(), PortRef::step_output(id, output)))
            .collect();

        Ok(StepOutputs {
            step: id.to_string(),
            ports,
        })
    }

    /// Declares a workflow output taken from `source`.
    pub fn declare_output(&mut self, name: &str, source: &PortRef) -> Result<()> {
        self.ensure_open("declare output")?;
        check_name(NameKind::Output, name)?;

        if self.outputs.contains_key(name) {
            return Err(GraphError::DuplicateName {
                kind: NameKind::Output,
                name: name.to_string(),
            });
        }

        let data_type = self
            .resolve_port(source)
            .ok_or_else(|| GraphError::UnresolvedReference {
                site: format!("Output '{}'", name),
                reference: source.to_string(),
            })?;

        debug!("Declared output '{}' <- {}", name, source);
        self.outputs.insert(
            name.to_string(),
            WorkflowOutput {
                source: source.clone(),
                data_type,
            },
        );
        Ok(())
    }

    /// Freezes the builder into an immutable graph.
    ///
    /// Idempotent: later calls return the same snapshot. Fails with
    /// `IncompleteGraph` if the workflow has no steps or an output
    /// source does not resolve.
    pub fn freeze(&mut self) -> Result<Arc<WorkflowGraph>> {
        if let Some(graph) = &self.frozen {
            return Ok(Arc::clone(graph));
        }

        if self.steps.is_empty() {
            return Err(GraphError::IncompleteGraph {
                workflow: self.name.clone(),
                reason: "workflow has no steps".to_string(),
            });
        }

        for (name, output) in &self.outputs {
            if self.resolve_port(&output.source).is_none() {
                return Err(GraphError::IncompleteGraph {
                    workflow: self.name.clone(),
                    reason: format!("output '{}' source '{}' is unresolved", name, output.source),
                });
            }
        }

        let graph = WorkflowGraph::from_parts(
            self.name.clone(),
            Arc::clone(&self.types),
            self.inputs.clone(),
            self.steps.clone(),
            self.outputs.clone(),
        );
        validate_graph(&graph)?;

        info!(
            "Workflow '{}' frozen: {} inputs, {} steps, {} outputs, {} tools",
            graph.name(),
            graph.inputs().len(),
            graph.len(),
            graph.outputs().len(),
            graph.tools().len()
        );

        let graph = Arc::new(graph);
        self.frozen = Some(Arc::clone(&graph));
        Ok(graph)
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.frozen.is_some() {
            return Err(GraphError::Frozen {
                workflow: self.name.clone(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn check_tool_types(&self, tool: &ToolSpec) -> Result<()> {
        let input_types = tool.inputs.values().map(|i| &i.data_type);
        let output_types = tool.outputs.values().map(|o| &o.data_type);
        for ty in input_types.chain(output_types) {
            self.types.check(ty)?;
        }
        Ok(())
    }

    /// A key embedded in the document must name exactly one tool definition.
    fn check_tool_key(&self, tool: &Arc<ToolSpec>) -> Result<()> {
        let key = tool.key();
        let clash = self.steps.iter().any(|step| {
            step.tool.key() == key && !Arc::ptr_eq(&step.tool, tool) && *step.tool != **tool
        });
        if clash {
            return Err(GraphError::DuplicateName {
                kind: NameKind::Tool,
                name: key,
            });
        }
        Ok(())
    }

    /// Resolves a port against what has been declared so far.
    fn resolve_port(&self, port: &PortRef) -> Option<DataType> {
        match port {
            PortRef::WorkflowInput(name) => self.inputs.get(name).map(|i| i.data_type.clone()),
            PortRef::StepOutput { step, output } => self
                .step_index
                .get(step)
                .and_then(|&i| self.steps[i].tool.output(output))
                .map(|o| o.data_type.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolInput, ToolOutput};
    use crate::types::{Literal, TypeDef};

    fn types() -> Arc<TypeRegistry> {
        Arc::new(
            TypeRegistry::from_defs(vec![
                TypeDef::new("FastqPair"),
                TypeDef::new("Bam"),
                TypeDef::new("IndexedBam").extending("Bam"),
                TypeDef::new("Vcf"),
            ])
            .unwrap(),
        )
    }

    fn ty(expr: &str) -> DataType {
        expr.parse().unwrap()
    }

    fn aligner() -> Arc<ToolSpec> {
        Arc::new(
            ToolSpec::new("Aligner", "1.0")
                .with_input("in", ToolInput::new(ty("FastqPair")))
                .with_output("out", ToolOutput::new(ty("Bam"))),
        )
    }

    fn sorter() -> Arc<ToolSpec> {
        Arc::new(
            ToolSpec::new("Sorter", "2.0")
                .with_input("in", ToolInput::new(ty("Bam")))
                .with_input(
                    "sortOrder",
                    ToolInput::new(ty("String")).with_default("coordinate"),
                )
                .with_input("threads", ToolInput::new(ty("Int")).optional())
                .with_output("out", ToolOutput::new(ty("IndexedBam"))),
        )
    }

    fn caller() -> Arc<ToolSpec> {
        Arc::new(
            ToolSpec::new("Caller", "3.0")
                .with_input("bam", ToolInput::new(ty("Bam")))
                .with_input("known", ToolInput::new(ty("Vcf[]")).optional())
                .with_output("vcf", ToolOutput::new(ty("Vcf"))),
        )
    }

    fn no_bindings() -> Vec<(&'static str, Binding)> {
        Vec::new()
    }

    #[test]
    fn test_two_step_chain() {
        let mut builder = WorkflowBuilder::new("chain", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();

        let s1 = builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();
        assert_eq!(s1.get("out"), Some(&PortRef::step_output("s1", "out")));

        let s2 = builder
            .add_step("s2", &sorter(), [("in", s1.output("out").unwrap())])
            .unwrap();
        builder
            .declare_output("result", &s2.output("out").unwrap())
            .unwrap();

        let graph = builder.freeze().unwrap();
        let ids: Vec<_> = graph.steps().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(graph.outputs()["result"].data_type, ty("IndexedBam"));
    }

    #[test]
    fn test_declare_input_duplicate() {
        let mut builder = WorkflowBuilder::new("w", types());
        builder.declare_input("reads", ty("FastqPair")).unwrap();

        let err = builder.declare_input("reads", ty("Bam")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName { kind: NameKind::Input, .. }));
    }

    #[test]
    fn test_declare_input_clashes_with_step() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        builder.add_step("align", &aligner(), [("in", &reads)]).unwrap();

        assert!(matches!(
            builder.declare_input("align", ty("Bam")),
            Err(GraphError::DuplicateName { .. })
        ));
        assert!(matches!(
            builder.add_step("reads", &aligner(), [("in", &reads)]),
            Err(GraphError::DuplicateName { kind: NameKind::Step, .. })
        ));
    }

    #[test]
    fn test_declare_input_unknown_type() {
        let mut builder = WorkflowBuilder::new("w", types());
        let err = builder.declare_input("x", ty("Cram[]")).unwrap_err();
        assert!(matches!(err, GraphError::UnknownType { ref name } if name == "Cram"));
    }

    #[test]
    fn test_duplicate_step_id() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();

        let err = builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName { kind: NameKind::Step, ref name } if name == "s1"));
    }

    #[test]
    fn test_unknown_input_name() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();

        let err = builder
            .add_step("s1", &aligner(), [("in", &reads), ("fastq", &reads)])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownInput { ref input, .. } if input == "fastq"));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut builder = WorkflowBuilder::new("w", types());
        builder.declare_input("reads", ty("FastqPair")).unwrap();

        let err = builder
            .add_step("s2", &sorter(), [("in", PortRef::step_output("s1", "out"))])
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnresolvedReference { ref reference, .. } if reference == "steps.s1/out"
        ));
        assert!(err.to_string().contains("s2"));
    }

    #[test]
    fn test_unknown_output_of_existing_step() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        let s1 = builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();

        assert!(s1.output("bai").is_err());
        let err = builder
            .add_step("s2", &sorter(), [("in", PortRef::step_output("s1", "bai"))])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_type_mismatch_names_everything() {
        let mut builder = WorkflowBuilder::new("w", types());
        let variants = builder.declare_input("variants", ty("Vcf")).unwrap();

        let err = builder
            .add_step("s1", &sorter(), [("in", &variants)])
            .unwrap_err();
        match err {
            GraphError::TypeMismatch {
                step,
                input,
                expected,
                actual,
            } => {
                assert_eq!(step, "s1");
                assert_eq!(input, "in");
                assert_eq!(expected, "Bam");
                assert_eq!(actual, "Vcf");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_subtype_accepted_supertype_rejected() {
        let mut builder = WorkflowBuilder::new("w", types());
        let indexed = builder.declare_input("indexed", ty("IndexedBam")).unwrap();
        let plain = builder.declare_input("plain", ty("Bam")).unwrap();

        assert!(builder.add_step("ok", &caller(), [("bam", &indexed)]).is_ok());

        let needs_indexed = Arc::new(
            ToolSpec::new("NeedsIndex", "1")
                .with_input("bam", ToolInput::new(ty("IndexedBam")))
                .with_output("out", ToolOutput::new(ty("Bam"))),
        );
        assert!(matches!(
            builder.add_step("bad", &needs_indexed, [("bam", &plain)]),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_no_auto_wrapping_into_array() {
        let mut builder = WorkflowBuilder::new("w", types());
        let bam = builder.declare_input("bam", ty("Bam")).unwrap();
        let single = builder.declare_input("single", ty("Vcf")).unwrap();
        let many = builder.declare_input("many", ty("Vcf[]")).unwrap();

        let err = builder
            .add_step("s1", &caller(), [("bam", &bam), ("known", &single)])
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::TypeMismatch { ref expected, ref actual, .. } if expected == "Vcf[]" && actual == "Vcf"
        ));

        assert!(builder
            .add_step("s2", &caller(), [("bam", &bam), ("known", &many)])
            .is_ok());
    }

    #[test]
    fn test_literal_bindings() {
        let mut builder = WorkflowBuilder::new("w", types());
        let bam = builder.declare_input("bam", ty("Bam")).unwrap();

        let bindings: Vec<(&str, Binding)> = vec![
            ("in", bam.clone().into()),
            ("sortOrder", "queryname".into()),
            ("threads", 4.into()),
        ];
        builder.add_step("sort", &sorter(), bindings).unwrap();

        let bindings: Vec<(&str, Binding)> =
            vec![("in", bam.clone().into()), ("threads", "four".into())];
        let err = builder.add_step("sort2", &sorter(), bindings).unwrap_err();
        assert!(matches!(
            err,
            GraphError::TypeMismatch { ref actual, .. } if actual.contains("String literal")
        ));

        let bindings: Vec<(&str, Binding)> = vec![("in", "reads.bam".into())];
        assert!(matches!(
            builder.add_step("sort3", &sorter(), bindings),
            Err(GraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_required_input() {
        let mut builder = WorkflowBuilder::new("w", types());
        let err = builder.add_step("s1", &aligner(), no_bindings()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingRequiredInput { ref step, ref input, .. } if step == "s1" && input == "in"
        ));
    }

    #[test]
    fn test_bad_default_rejected_at_add_step() {
        let tool = Arc::new(
            ToolSpec::new("Threaded", "1")
                .with_input("threads", ToolInput::new(ty("Int")).with_default("four"))
                .with_output("out", ToolOutput::new(ty("Bam"))),
        );
        let mut builder = WorkflowBuilder::new("w", types());

        let err = builder.add_step("s1", &tool, no_bindings()).unwrap_err();
        assert!(!err.is_internal());
        match err {
            GraphError::TypeMismatch {
                step,
                input,
                expected,
                actual,
            } => {
                assert_eq!(step, "s1");
                assert_eq!(input, "threads");
                assert_eq!(expected, "Int");
                assert!(actual.contains("(default)"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(builder.step_index.is_empty());

        // Binding the input explicitly bypasses the broken default.
        let bindings: Vec<(&str, Binding)> = vec![("threads", 4.into())];
        builder.add_step("s1", &tool, bindings).unwrap();
        assert!(builder.freeze().is_ok());
    }

    #[test]
    fn test_file_default_rejected_at_add_step() {
        let tool = Arc::new(
            ToolSpec::new("WithFile", "1")
                .with_input("bam", ToolInput::new(ty("Bam")).with_default("reads.bam"))
                .with_output("out", ToolOutput::new(ty("Bam"))),
        );
        let mut builder = WorkflowBuilder::new("w", types());
        assert!(matches!(
            builder.add_step("s1", &tool, no_bindings()),
            Err(GraphError::TypeMismatch { ref input, .. }) if input == "bam"
        ));
    }

    #[test]
    fn test_ambiguous_tool_identity_rejected() {
        let mut builder = WorkflowBuilder::new("w", types());
        let first = Arc::new(
            ToolSpec::new("a_b", "c").with_output("out", ToolOutput::new(ty("Bam"))),
        );
        let second = Arc::new(
            ToolSpec::new("a", "b_c").with_output("out", ToolOutput::new(ty("Bam"))),
        );

        builder.add_step("s1", &first, no_bindings()).unwrap();
        assert!(matches!(
            builder.add_step("s2", &second, no_bindings()),
            Err(GraphError::InvalidName { kind: NameKind::Tool, .. })
        ));
    }

    #[test]
    fn test_conflicting_tool_definitions_rejected() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();

        // Equal definitions behind different handles are the same tool.
        builder.add_step("s2", &aligner(), [("in", &reads)]).unwrap();

        let impostor = Arc::new(
            ToolSpec::new("Aligner", "1.0")
                .with_input("in", ToolInput::new(ty("FastqPair")))
                .with_output("out", ToolOutput::new(ty("Vcf"))),
        );
        let err = builder
            .add_step("s3", &impostor, [("in", &reads)])
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::DuplicateName { kind: NameKind::Tool, ref name } if name == "Aligner_1.0"
        ));
    }

    #[test]
    fn test_required_input_satisfied_by_default() {
        let tool = Arc::new(
            ToolSpec::new("Defaulted", "1")
                .with_input("mode", ToolInput::new(ty("String")).with_default("fast"))
                .with_output("out", ToolOutput::new(ty("Bam"))),
        );
        let mut builder = WorkflowBuilder::new("w", types());
        builder.add_step("s1", &tool, no_bindings()).unwrap();

        let graph = builder.freeze().unwrap();
        assert_eq!(
            graph.step("s1").unwrap().bindings["mode"],
            Binding::Literal(Literal::from("fast"))
        );
    }

    #[test]
    fn test_defaults_materialised_optional_left_unbound() {
        let mut builder = WorkflowBuilder::new("w", types());
        let bam = builder.declare_input("bam", ty("Bam")).unwrap();
        builder.add_step("sort", &sorter(), [("in", &bam)]).unwrap();

        let graph = builder.freeze().unwrap();
        let step = graph.step("sort").unwrap();
        assert_eq!(
            step.bindings["sortOrder"],
            Binding::Literal(Literal::from("coordinate"))
        );
        assert!(!step.bindings.contains_key("threads"));
    }

    #[test]
    fn test_unregistered_tool_type() {
        let tool = Arc::new(
            ToolSpec::new("Odd", "1").with_output("out", ToolOutput::new(ty("Cram"))),
        );
        let mut builder = WorkflowBuilder::new("w", types());
        assert!(matches!(
            builder.add_step("s1", &tool, no_bindings()),
            Err(GraphError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_duplicate_binding_key() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        let err = builder
            .add_step("s1", &aligner(), [("in", &reads), ("in", &reads)])
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName { kind: NameKind::Input, .. }));
    }

    #[test]
    fn test_declare_output_errors() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        let s1 = builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();
        let out = s1.output("out").unwrap();

        builder.declare_output("bam", &out).unwrap();
        assert!(matches!(
            builder.declare_output("bam", &out),
            Err(GraphError::DuplicateName { kind: NameKind::Output, .. })
        ));
        assert!(matches!(
            builder.declare_output("ghost", &PortRef::step_output("s9", "out")),
            Err(GraphError::UnresolvedReference { .. })
        ));
        // Outputs have their own namespace.
        assert!(builder.declare_output("reads", &reads).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        let mut builder = WorkflowBuilder::new("w", types());
        assert!(matches!(
            builder.declare_input("bad name", ty("Bam")),
            Err(GraphError::InvalidName { .. })
        ));
        assert!(matches!(
            builder.add_step("", &aligner(), no_bindings()),
            Err(GraphError::InvalidName { kind: NameKind::Step, .. })
        ));
    }

    #[test]
    fn test_freeze_empty_workflow() {
        let mut builder = WorkflowBuilder::new("w", types());
        builder.declare_input("reads", ty("FastqPair")).unwrap();
        assert!(matches!(
            builder.freeze(),
            Err(GraphError::IncompleteGraph { .. })
        ));
        assert!(!builder.is_frozen());
    }

    #[test]
    fn test_freeze_idempotent_and_final() {
        let mut builder = WorkflowBuilder::new("w", types());
        let reads = builder.declare_input("reads", ty("FastqPair")).unwrap();
        builder.add_step("s1", &aligner(), [("in", &reads)]).unwrap();

        let first = builder.freeze().unwrap();
        let second = builder.freeze().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(builder.is_frozen());

        assert!(matches!(
            builder.declare_input("more", ty("Bam")),
            Err(GraphError::Frozen { .. })
        ));
        assert!(matches!(
            builder.add_step("s2", &aligner(), [("in", &reads)]),
            Err(GraphError::Frozen { .. })
        ));
        assert!(matches!(
            builder.declare_output("x", &reads),
            Err(GraphError::Frozen { .. })
        ));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_independent_builders_share_registry() {
        let registry = types();
        let mut a = WorkflowBuilder::new("a", Arc::clone(&registry));
        let mut b = WorkflowBuilder::new("b", Arc::clone(&registry));

        a.declare_input("reads", ty("FastqPair")).unwrap();
        b.declare_input("reads", ty("Bam")).unwrap();
        assert_eq!(a.name(), "a");
        assert_eq!(b.name(), "b");
    }
}
