//! Workflow Definition Module
//!
//! Provides the data structures and builder for declaring typed
//! workflow graphs, plus a YAML front-end that drives the builder.
//!
//! # Structure
//!
//! - [`port`]: Port references and step input bindings
//! - [`model`]: Frozen graph data structures (StepNode, WorkflowGraph)
//! - [`builder`]: Declaration-time validated graph construction
//! - [`validator`]: Structural re-validation and topological ordering
//! - [`parser`]: YAML loading of types, tools and workflows

pub mod builder;
pub mod model;
pub mod parser;
pub mod port;
pub mod validator;

pub use builder::{StepOutputs, WorkflowBuilder};
pub use model::{StepNode, WorkflowGraph, WorkflowInput, WorkflowOutput};
pub use parser::{load_tools, load_types, load_workflow};
pub use port::{Binding, PortRef};
