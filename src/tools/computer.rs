use serde_json::json;

use crate::core::tool::ToolDescriptor;
use crate::dispatch::COMPUTER_TOOL;
use crate::surface::Viewport;
use crate::tools::types::{Tool, ToolKind};

/// Browser control: pointer, keyboard and screenshots.
pub struct ComputerTool {
    viewport: Viewport,
}

impl ComputerTool {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }
}

impl Tool for ComputerTool {
    fn descriptor(&self) -> ToolDescriptor {
        let point = json!({
            "type": "array",
            "items": {"type": "number"},
            "minItems": 2,
            "maxItems": 2
        });
        ToolDescriptor {
            name: COMPUTER_TOOL.into(),
            description: format!(
                "Control the browser showing the game. The screen is {}x{} pixels; coordinates \
                 are [x, y] from the top-left corner. Every action returns a screenshot taken \
                 after it completes.",
                self.viewport.width, self.viewport.height
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": [
                            "screenshot", "left_click", "right_click", "middle_click", "click",
                            "double_click", "triple_click", "left_click_drag", "drag",
                            "left_mouse_down", "left_mouse_up", "mouse_move", "move",
                            "scroll", "type", "key", "keypress", "hold_key", "wait"
                        ],
                        "description": "The action to perform"
                    },
                    "coordinate": point.clone(),
                    "start_coordinate": point.clone(),
                    "end_coordinate": point,
                    "path": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"x": {"type": "number"}, "y": {"type": "number"}},
                            "required": ["x", "y"]
                        },
                        "description": "Points to drag through (drag)"
                    },
                    "button": {
                        "type": "string",
                        "enum": ["left", "right", "middle"],
                        "description": "Mouse button for click (default left)"
                    },
                    "text": {"type": "string", "description": "Text to type"},
                    "key": {
                        "type": "string",
                        "description": "Key or '+' separated chord, e.g. 'Return' or 'ctrl+a'"
                    },
                    "keys": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Keys pressed together (keypress)"
                    },
                    "scroll_direction": {"type": "string", "enum": ["up", "down", "left", "right"]},
                    "scroll_amount": {"type": "number", "description": "Pixels to scroll (default 100)"},
                    "scroll_x": {"type": "number"},
                    "scroll_y": {"type": "number"},
                    "duration": {"type": "number", "description": "Seconds to wait (default 1)"}
                },
                "required": ["action"]
            }),
        }
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Computer
    }
}
