use serde::Deserialize;

pub const COMMAND_NAMES: &[&str] = &["view", "create", "str_replace", "insert", "rename", "delete"];

/// One memory tool call, tagged by its `command` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MemoryCommand {
    View {
        #[serde(default)]
        path: Option<String>,
    },
    Create {
        path: String,
        #[serde(default)]
        file_text: Option<String>,
    },
    StrReplace {
        path: String,
        #[serde(default)]
        old_str: Option<String>,
        #[serde(default)]
        new_str: Option<String>,
    },
    Insert {
        path: String,
        #[serde(default)]
        insert_line: Option<i64>,
        #[serde(default)]
        insert_text: Option<String>,
    },
    Rename {
        old_path: String,
        new_path: String,
    },
    Delete {
        path: String,
    },
}

impl MemoryCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MemoryCommand::View { .. } => "view",
            MemoryCommand::Create { .. } => "create",
            MemoryCommand::StrReplace { .. } => "str_replace",
            MemoryCommand::Insert { .. } => "insert",
            MemoryCommand::Rename { .. } => "rename",
            MemoryCommand::Delete { .. } => "delete",
        }
    }

    /// Parses tool arguments. The error is the text returned to the agent.
    pub fn from_args(args: &serde_json::Value) -> Result<Self, String> {
        let command = args
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if !COMMAND_NAMES.contains(&command) {
            return Err(format!("Unknown memory command: {command}"));
        }
        serde_json::from_value(args.clone())
            .map_err(|e| format!("Error: Invalid arguments for {command} command: {e}"))
    }
}
