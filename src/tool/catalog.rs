//! Tool Catalog
//!
//! Read-only lookup of tool definitions by identity and version. Tools
//! are stored behind `Arc` so workflow steps share them instead of
//! copying.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::spec::ToolSpec;
use crate::error::{GraphError, NameKind, Result};

/// Catalog of tool definitions keyed by `(id, version)`.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<(String, String), Arc<ToolSpec>>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from a list of tools.
    pub fn from_tools(tools: impl IntoIterator<Item = ToolSpec>) -> Result<Self> {
        let mut catalog = Self::new();
        for tool in tools {
            catalog.register(tool)?;
        }
        Ok(catalog)
    }

    /// Adds a tool and returns the shared handle to it.
    ///
    /// Surrounding whitespace in the id and version is dropped. Fails with
    /// `InvalidName` if they could not form an unambiguous key, and with
    /// `DuplicateName` if the same id and version is already present.
    pub fn register(&mut self, mut tool: ToolSpec) -> Result<Arc<ToolSpec>> {
        tool.id = tool.id.trim().to_string();
        tool.version = tool.version.trim().to_string();
        tool.check_identity()?;

        let key = (tool.id.clone(), tool.version.clone());
        if self.tools.contains_key(&key) {
            return Err(GraphError::DuplicateName {
                kind: NameKind::Tool,
                name: tool.key(),
            });
        }

        debug!(
            "Registered tool '{}' ({} inputs, {} outputs)",
            tool.key(),
            tool.inputs.len(),
            tool.outputs.len()
        );

        let tool = Arc::new(tool);
        self.tools.insert(key, Arc::clone(&tool));
        Ok(tool)
    }

    /// Looks up a tool.
    ///
    /// Without a version the lookup only succeeds when the catalog holds
    /// exactly one version of the tool.
    pub fn get(&self, id: &str, version: Option<&str>) -> Result<Arc<ToolSpec>> {
        let unknown = || GraphError::UnknownTool {
            tool: id.to_string(),
            version: version.map(str::to_string),
        };

        match version {
            Some(v) => self
                .tools
                .get(&(id.to_string(), v.to_string()))
                .cloned()
                .ok_or_else(unknown),
            None => {
                let mut matches = self
                    .tools
                    .iter()
                    .filter(|((tool_id, _), _)| tool_id == id)
                    .map(|(_, tool)| tool);

                match (matches.next(), matches.next()) {
                    (Some(tool), None) => Ok(Arc::clone(tool)),
                    _ => Err(unknown()),
                }
            }
        }
    }

    /// Versions registered for a tool id, in sorted order.
    pub fn versions(&self, id: &str) -> Vec<&str> {
        self.tools
            .keys()
            .filter(|(tool_id, _)| tool_id == id)
            .map(|(_, version)| version.as_str())
            .collect()
    }

    /// Iterates over all tools in `(id, version)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ToolSpec>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
