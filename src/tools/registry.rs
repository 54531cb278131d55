//! Tool registry for declaration and name resolution.

use std::collections::HashMap;

use crate::core::tool::ToolDescriptor;
use crate::surface::Viewport;
use crate::tools::types::{Tool, ToolKind};
use crate::tools::{ComputerTool, GameEndedTool, MemoryTool};

/// Registry of the tools available for one run.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registers the computer and game end tools, plus the memory tool when
    /// memory is enabled.
    pub fn new(viewport: Viewport, memory_enabled: bool) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register(Box::new(ComputerTool::new(viewport)));
        registry.register(Box::new(GameEndedTool));
        if memory_enabled {
            registry.register(Box::new(MemoryTool));
        }
        registry
    }

    fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.descriptor().name, tool);
    }

    /// Descriptors sorted by name.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        self.tools.get(name).map(|tool| tool.kind())
    }
}
