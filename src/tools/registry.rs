//! Tool registry keyed by tool name.

use super::{Tool, ToolDeclaration};
use crate::error::{Result, SwellError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of available tools.
///
/// Built once at startup and shared read-only (behind an `Arc`) by any number
/// of agent runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(SwellError::DuplicateToolName(name));
        }
        self.index.insert(name.clone(), self.tools.len());
        self.tools.push(tool);
        debug!("Registered tool: {}", name);
        Ok(())
    }

    /// Declarations of all tools, in registration order.
    pub fn declarations(&self) -> impl Iterator<Item = &ToolDeclaration> + '_ {
        self.tools.iter().map(|tool| tool.declaration())
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| SwellError::UnknownTool(name.to_string()))
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| tool.name()))
            .finish()
    }
}
