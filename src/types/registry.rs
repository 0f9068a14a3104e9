//! Type Registry
//!
//! Holds every data type a workflow may mention and answers the one
//! question the graph builder asks of it: may a value of type `source`
//! be wired into a port declared as `target`?
//!
//! Every registered type descends from one of the builtin [`Primitive`]s
//! through its `extends` chain, e.g. `IndexedBam -> Bam -> File`.
//!
//! # Example YAML Format
//!
//! ```yaml
//! types:
//!   - name: Bam
//!     extends: File
//!   - name: IndexedBam
//!     extends: Bam
//!     secondary_files: [".bai"]
//! ```

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::datatype::DataType;
use super::literal::Literal;
use crate::error::{check_name, GraphError, NameKind, Result};

/// Builtin root types every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Int,
    Float,
    Boolean,
    File,
    Directory,
}

impl Primitive {
    /// All builtin primitives in registration order.
    pub const ALL: [Primitive; 6] = [
        Primitive::String,
        Primitive::Int,
        Primitive::Float,
        Primitive::Boolean,
        Primitive::File,
        Primitive::Directory,
    ];

    /// Registered type name of this primitive.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::File => "File",
            Self::Directory => "Directory",
        }
    }

    /// Name used for this primitive in the translated document.
    pub fn cwl_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::File => "File",
            Self::Directory => "Directory",
        }
    }

    /// Returns true if a literal of this kind can stand for a value of
    /// this primitive. Files and directories are never literals, and
    /// NaN or infinite floats have no portable representation.
    fn accepts(&self, literal: &Literal) -> bool {
        match (self, literal) {
            (Self::Float, Literal::Float(value)) => value.is_finite(),
            _ => matches!(
                (self, literal),
                (Self::String, Literal::String(_))
                    | (Self::Int, Literal::Int(_))
                    | (Self::Float, Literal::Int(_))
                    | (Self::Boolean, Literal::Boolean(_))
            ),
        }
    }
}

/// Definition of a registered data type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    /// Unique type name (e.g. "FastaWithIndexes")
    pub name: String,

    /// Parent type; user types without one extend `File`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Index files that travel with the primary file (e.g. ".fai")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl TypeDef {
    /// Creates a definition with no parent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            secondary_files: Vec::new(),
            doc: None,
        }
    }

    /// Sets the parent type.
    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Sets the secondary file suffixes.
    pub fn with_secondary_files<S: Into<String>>(mut self, suffixes: Vec<S>) -> Self {
        self.secondary_files = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the description.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

static BUILTIN_TYPES: Lazy<Vec<(TypeDef, Primitive)>> = Lazy::new(|| {
    Primitive::ALL
        .iter()
        .map(|p| (TypeDef::new(p.name()), *p))
        .collect()
});

#[derive(Debug, Clone)]
struct Entry {
    def: TypeDef,
    primitive: Primitive,
}

/// Registry of data types. Read-only once populated, so it is shared
/// between builders and graphs behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, Entry>,
}

impl TypeRegistry {
    /// Creates a registry containing only the builtin primitives.
    pub fn new() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|(def, primitive)| {
                (
                    def.name.clone(),
                    Entry {
                        def: def.clone(),
                        primitive: *primitive,
                    },
                )
            })
            .collect();
        Self { types }
    }

    /// Creates a registry with the builtins plus the given definitions,
    /// registered in order.
    pub fn from_defs(defs: impl IntoIterator<Item = TypeDef>) -> Result<Self> {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Registers a type. The parent must already be registered.
    ///
    /// Registering an identical definition twice is a no-op; a different
    /// definition under an existing name fails with `DuplicateName`.
    pub fn register(&mut self, mut def: TypeDef) -> Result<()> {
        check_name(NameKind::Type, &def.name)?;

        if def.extends.is_none() {
            def.extends = Some(Primitive::File.name().to_string());
        }

        if let Some(existing) = self.types.get(&def.name) {
            if existing.def == def {
                debug!("Type '{}' already registered", def.name);
                return Ok(());
            }
            return Err(GraphError::DuplicateName {
                kind: NameKind::Type,
                name: def.name,
            });
        }

        let parent = def.extends.as_deref().unwrap_or(Primitive::File.name());
        let primitive = self
            .types
            .get(parent)
            .map(|entry| entry.primitive)
            .ok_or_else(|| GraphError::UnknownType {
                name: parent.to_string(),
            })?;

        debug!("Registered type '{}' extends '{}'", def.name, parent);
        self.types.insert(def.name.clone(), Entry { def, primitive });
        Ok(())
    }

    /// Looks up a type definition by name.
    pub fn resolve(&self, name: &str) -> Result<&TypeDef> {
        self.types
            .get(name)
            .map(|entry| &entry.def)
            .ok_or_else(|| GraphError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Fails with `UnknownType` unless every name in the expression is registered.
    pub fn check(&self, ty: &DataType) -> Result<()> {
        self.resolve(ty.base_name()).map(|_| ())
    }

    /// Parses a type expression and checks it against the registry.
    pub fn parse(&self, expr: &str) -> Result<DataType> {
        let ty: DataType = expr.parse()?;
        self.check(&ty)?;
        Ok(ty)
    }

    /// Returns true if `name` is `ancestor` or descends from it.
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self
                .types
                .get(n)
                .and_then(|entry| entry.def.extends.as_deref());
        }
        false
    }

    /// Decides whether a value of type `source` may be bound to a port
    /// declared as `target`.
    ///
    /// Reflexive; named types follow the subtype relation; arrays are
    /// compatible element-wise. A bare `T` is never wrapped into `T[]`
    /// and an array is never unwrapped.
    pub fn compatible(&self, source: &DataType, target: &DataType) -> bool {
        match (source, target) {
            (DataType::Named(s), DataType::Named(t)) => self.is_subtype(s, t),
            (DataType::Array(s), DataType::Array(t)) => self.compatible(s, t),
            _ => false,
        }
    }

    /// Decides whether a literal may be bound to a port declared as `target`.
    ///
    /// Literals are checked against the primitive at the root of the
    /// target's `extends` chain, lists element-wise against array targets.
    pub fn accepts_literal(&self, literal: &Literal, target: &DataType) -> bool {
        match (literal, target) {
            (Literal::List(items), DataType::Array(item_ty)) => items
                .iter()
                .all(|item| self.accepts_literal(item, item_ty)),
            (_, DataType::Named(name)) => self
                .primitive_of(name)
                .is_some_and(|primitive| primitive.accepts(literal)),
            _ => false,
        }
    }

    /// The builtin primitive a named type descends from.
    pub fn primitive_of(&self, name: &str) -> Option<Primitive> {
        self.types.get(name).map(|entry| entry.primitive)
    }

    /// Secondary file suffixes declared on a named type.
    pub fn secondary_files(&self, name: &str) -> &[String] {
        self.types
            .get(name)
            .map(|entry| entry.def.secondary_files.as_slice())
            .unwrap_or(&[])
    }

    /// Registered type names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Number of registered types, builtins included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: builtins are registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
