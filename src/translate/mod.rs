//! Translation Module
//!
//! Turns a frozen workflow graph into a portable, self-contained
//! workflow document.
//!
//! - [`document`]: Serializable document model
//! - [`cwl`]: Graph to CWL-style document translation

pub mod cwl;
pub mod document;

pub use cwl::{translate, CwlTranslator, DEFAULT_CWL_VERSION};
pub use document::Document;
