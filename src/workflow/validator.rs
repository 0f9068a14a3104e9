//! Workflow Graph Validation
//!
//! Structural re-validation of a workflow graph, used as a safety net
//! when a graph is frozen and again before it is translated:
//! - Name uniqueness
//! - Reference integrity (every port resolves)
//! - Type compatibility of every binding
//! - Dependency graph validation (no cycles, edges point backward)
//!
//! The builder already enforces all of this at declaration time, so a
//! failure here means the graph was produced by something else and is
//! reported as an internal `InvalidGraph` fault.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use log::{debug, error};

use super::model::WorkflowGraph;
use super::port::{Binding, PortRef};
use crate::error::{GraphError, Result};

/// A single structural problem found in a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIssue {
    DuplicateStepId(String),
    StepShadowsInput(String),
    UnknownToolInput { step: String, input: String },
    DanglingReference { site: String, reference: PortRef },
    ForwardReference { step: String, reference: PortRef },
    TypeMismatch { step: String, input: String },
    UnboundRequiredInput { step: String, input: String },
    CyclicDependency,
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateStepId(id) => write!(f, "Duplicate step ID: '{}'", id),
            Self::StepShadowsInput(id) => {
                write!(f, "Step '{}' has the same name as a workflow input", id)
            }
            Self::UnknownToolInput { step, input } => {
                write!(f, "Step '{}' binds undeclared tool input '{}'", step, input)
            }
            Self::DanglingReference { site, reference } => {
                write!(f, "{} references unknown port '{}'", site, reference)
            }
            Self::ForwardReference { step, reference } => {
                write!(f, "Step '{}' references '{}' which is declared after it", step, reference)
            }
            Self::TypeMismatch { step, input } => {
                write!(f, "Step '{}' input '{}' is bound to an incompatible source", step, input)
            }
            Self::UnboundRequiredInput { step, input } => {
                write!(f, "Step '{}' leaves required input '{}' unbound", step, input)
            }
            Self::CyclicDependency => {
                write!(f, "Workflow contains cyclic dependencies (steps depend on each other in a loop)")
            }
        }
    }
}

/// Collects every structural problem in the graph.
pub fn find_issues(graph: &WorkflowGraph) -> Vec<GraphIssue> {
    let mut issues = Vec::new();
    let types = graph.types();

    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (index, step) in graph.steps().iter().enumerate() {
        if positions.insert(step.id.as_str(), index).is_some() {
            issues.push(GraphIssue::DuplicateStepId(step.id.clone()));
        }
        if graph.inputs().contains_key(&step.id) {
            issues.push(GraphIssue::StepShadowsInput(step.id.clone()));
        }
    }

    for (index, step) in graph.steps().iter().enumerate() {
        for (name, binding) in &step.bindings {
            let Some(declared) = step.tool.input(name) else {
                issues.push(GraphIssue::UnknownToolInput {
                    step: step.id.clone(),
                    input: name.clone(),
                });
                continue;
            };

            let accepted = match binding {
                Binding::Literal(literal) => types.accepts_literal(literal, &declared.data_type),
                Binding::Port(port) => {
                    let Some(source_ty) = graph.port_type(port) else {
                        issues.push(GraphIssue::DanglingReference {
                            site: format!("Step '{}' input '{}'", step.id, name),
                            reference: port.clone(),
                        });
                        continue;
                    };

                    if let Some(producer) = port.step_id() {
                        if positions.get(producer).is_some_and(|&p| p >= index) {
                            issues.push(GraphIssue::ForwardReference {
                                step: step.id.clone(),
                                reference: port.clone(),
                            });
                        }
                    }

                    types.compatible(source_ty, &declared.data_type)
                }
            };

            if !accepted {
                issues.push(GraphIssue::TypeMismatch {
                    step: step.id.clone(),
                    input: name.clone(),
                });
            }
        }

        for (name, declared) in &step.tool.inputs {
            if declared.required && !step.bindings.contains_key(name) {
                issues.push(GraphIssue::UnboundRequiredInput {
                    step: step.id.clone(),
                    input: name.clone(),
                });
            }
        }
    }

    for (name, output) in graph.outputs() {
        if graph.port_type(&output.source).is_none() {
            issues.push(GraphIssue::DanglingReference {
                site: format!("Output '{}'", name),
                reference: output.source.clone(),
            });
        }
    }

    if topological_order(graph).is_err() {
        issues.push(GraphIssue::CyclicDependency);
    }

    issues
}

/// Validates the graph, failing with `InvalidGraph` listing every issue.
pub fn validate_graph(graph: &WorkflowGraph) -> Result<()> {
    debug!(
        "Validating workflow '{}' with {} steps",
        graph.name(),
        graph.len()
    );

    let issues = find_issues(graph);
    if issues.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
    error!(
        "Workflow '{}' failed structural validation with {} issue(s)",
        graph.name(),
        issues.len()
    );
    Err(GraphError::InvalidGraph(messages.join("\n")))
}

/// Orders steps with Kahn's algorithm, breaking ties by declaration order.
///
/// Returns step indices. For graphs produced by the builder this is
/// always `0..len`. References to unknown steps are ignored here.
pub fn topological_order(graph: &WorkflowGraph) -> Result<Vec<usize>> {
    let steps = graph.steps();
    let index_of: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    // Build in-degree map and successor lists
    let mut in_degree = vec![0usize; steps.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (i, step) in steps.iter().enumerate() {
        let producers: HashSet<usize> = step
            .dependencies()
            .into_iter()
            .filter_map(|id| index_of.get(id).copied())
            .collect();

        in_degree[i] = producers.len();
        for p in producers {
            successors[p].push(i);
        }
    }

    // Start with root nodes (in-degree = 0)
    let mut ready: BTreeSet<usize> = (0..steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted_order = Vec::with_capacity(steps.len());

    while let Some(current) = ready.pop_first() {
        sorted_order.push(current);

        for &successor in &successors[current] {
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                ready.insert(successor);
            }
        }
    }

    // Check for cycles
    if sorted_order.len() != steps.len() {
        return Err(GraphError::InvalidGraph(
            GraphIssue::CyclicDependency.to_string(),
        ));
    }

    debug!(
        "Topological order: {:?}",
        sorted_order.iter().map(|&i| &steps[i].id).collect::<Vec<_>>()
    );

    Ok(sorted_order)
}
