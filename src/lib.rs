//! PipeWeaver - Typed Workflow Graph Builder
//!
//! Declare typed workflow inputs, wire tool invocations into a directed
//! acyclic graph with type-checked port bindings, and translate the frozen
//! graph into a portable CWL-style document.
//!
//! # Architecture
//!
//! The library is organized into five modules:
//!
//! - [`types`]: Data type registry with subtyping and literal checks
//! - [`tool`]: Tool contracts and the versioned tool catalog
//! - [`workflow`]: Port references, the graph builder and YAML loading
//! - [`translate`]: Deterministic translation into a workflow document
//! - [`error`]: Error taxonomy shared by every module
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pipeweaver::tool::{ToolInput, ToolOutput, ToolSpec};
//! use pipeweaver::types::{DataType, TypeDef, TypeRegistry};
//! use pipeweaver::{translate, WorkflowBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut types = TypeRegistry::new();
//!     types.register(TypeDef::new("Sam"))?;
//!     types.register(TypeDef::new("Bam"))?;
//!     let types = Arc::new(types);
//!
//!     let view = Arc::new(
//!         ToolSpec::new("SamToolsView", "1.9")
//!             .with_input("sam", ToolInput::new(DataType::named("Sam")))
//!             .with_output("out", ToolOutput::new(DataType::named("Bam"))),
//!     );
//!
//!     let mut w = WorkflowBuilder::new("convert", types);
//!     let sam = w.declare_input("sam", DataType::named("Sam"))?;
//!     let view_step = w.add_step("samtoolsview", &view, [("sam", sam)])?;
//!     w.declare_output("bam", &view_step.output("out")?)?;
//!
//!     let graph = w.freeze()?;
//!     let document = translate(&graph)?;
//!     println!("{}", document.to_yaml()?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod tool;
pub mod translate;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use error::{GraphError, Result};
pub use tool::{ToolCatalog, ToolSpec};
pub use translate::{translate, CwlTranslator, Document};
pub use types::{DataType, TypeRegistry};
pub use workflow::{PortRef, WorkflowBuilder, WorkflowGraph};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "PipeWeaver";
