//! Data Type Module
//!
//! Data-type identities, literal values and the registry that decides
//! which types may be wired into which ports.
//!
//! # Structure
//!
//! - [`datatype`]: Type expressions (`Bam`, `VcfTabix[]`)
//! - [`literal`]: Constant values bound directly to tool inputs
//! - [`registry`]: Registered types, subtype relation and compatibility

pub mod datatype;
pub mod literal;
pub mod registry;

pub use datatype::DataType;
pub use literal::Literal;
pub use registry::{Primitive, TypeDef, TypeRegistry};
