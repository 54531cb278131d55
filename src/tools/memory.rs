use serde_json::json;

use crate::core::tool::ToolDescriptor;
use crate::memory::MEMORY_TOOL;
use crate::tools::types::{Tool, ToolKind};

/// Files that persist between games.
pub struct MemoryTool;

impl Tool for MemoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: MEMORY_TOOL.into(),
            description: concat!(
                "Read and write your memory files, which persist across games. ",
                "Paths start with '/', the root of your memory directory. ",
                "Commands: view (list files or read one), create, str_replace, insert, rename, delete."
            )
            .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["view", "create", "str_replace", "insert", "rename", "delete"]
                    },
                    "path": {"type": "string", "description": "File or directory, e.g. /strategy.md"},
                    "file_text": {"type": "string", "description": "Content for create"},
                    "old_str": {"type": "string", "description": "Text to replace (first occurrence)"},
                    "new_str": {"type": "string", "description": "Replacement text"},
                    "insert_line": {"type": "integer", "description": "Line index to insert before; the line count appends"},
                    "insert_text": {"type": "string"},
                    "old_path": {"type": "string"},
                    "new_path": {"type": "string"}
                },
                "required": ["command"]
            }),
        }
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Memory
    }
}
