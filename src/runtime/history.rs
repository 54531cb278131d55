//! The running conversation of one game.

use crate::core::message::{Message, ToolPayload, ToolResult};

pub const SNAPSHOT_PLACEHOLDER: &str = "[screenshot omitted]";

/// Append-only message history owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.messages.iter().filter_map(|message| match message {
            Message::ToolResult(result) => Some(result),
            _ => None,
        })
    }

    /// Copy of the history for a model request with all but the newest
    /// `keep_snapshots` images replaced by a placeholder.
    pub fn pruned(&self, keep_snapshots: Option<usize>) -> Vec<Message> {
        let Some(keep) = keep_snapshots else {
            return self.messages.clone();
        };
        let total = self
            .tool_results()
            .filter(|result| result.payload.is_image())
            .count();
        let mut to_strip = total.saturating_sub(keep);

        self.messages
            .iter()
            .map(|message| match message {
                Message::ToolResult(result) if to_strip > 0 && result.payload.is_image() => {
                    to_strip -= 1;
                    Message::ToolResult(ToolResult {
                        invocation_id: result.invocation_id.clone(),
                        tool_name: result.tool_name.clone(),
                        payload: ToolPayload::Text(SNAPSHOT_PLACEHOLDER.to_string()),
                    })
                }
                other => other.clone(),
            })
            .collect()
    }
}
