//! Tool Module
//!
//! The abstract contract every invocable tool exposes and the catalog
//! that hands tools out to workflow steps.

pub mod catalog;
pub mod spec;

pub use catalog::ToolCatalog;
pub use spec::{ToolInput, ToolOutput, ToolSpec};
