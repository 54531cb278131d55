use serde_json::json;

use crate::core::tool::ToolDescriptor;
use crate::runtime::game_end::GAME_ENDED_TOOL;
use crate::tools::types::{Tool, ToolKind};

/// Declares the game over.
pub struct GameEndedTool;

impl Tool for GameEndedTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: GAME_ENDED_TOOL.into(),
            description: concat!(
                "Call this once the page shows that the game is over ",
                "(\"Player X wins!\", \"Player O wins!\" or \"It's a draw!\"). ",
                "Report the result from your point of view."
            )
            .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "result": {"type": "string", "enum": ["win", "loss", "draw"]},
                    "winner": {"type": "string", "enum": ["X", "O"], "description": "Omit for a draw"}
                },
                "required": ["result"]
            }),
        }
    }

    fn kind(&self) -> ToolKind {
        ToolKind::GameEnded
    }
}
