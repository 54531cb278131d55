//! Tools offered to the agent.
//!
//! # Module Structure
//!
//! - `types`: the Tool trait and the closed set of tool kinds
//! - `registry`: ToolRegistry for listing descriptors and resolving names
//! - `computer`: the browser control tool
//! - `memory`: the persistent memory tool
//! - `game`: the game end tool
//!
//! Execution lives in the runtime (`runtime::tools`), which owns the state
//! each tool acts on.

pub use registry::ToolRegistry;
pub use types::{Tool, ToolKind};

mod computer;
mod game;
mod memory;
mod registry;
mod types;

pub use computer::ComputerTool;
pub use game::GameEndedTool;
pub use memory::MemoryTool;
