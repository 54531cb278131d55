//! Shared types and traits for the tool system.

use crate::core::tool::ToolDescriptor;

/// The tools the runtime knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Computer,
    Memory,
    GameEnded,
}

/// A tool declaration.
///
/// Tools only describe themselves here; the runtime routes each call by
/// [`ToolKind`] to the component that owns the state it changes.
pub trait Tool: Send + Sync {
    /// Returns the descriptor for this tool, including name, description,
    /// and JSON schema for inputs.
    fn descriptor(&self) -> ToolDescriptor;

    fn kind(&self) -> ToolKind;
}
