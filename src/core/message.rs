//! Conversation history entries exchanged with the agent.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const PNG_MIME_TYPE: &str = "image/png";

/// A single tool invocation requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Encoded image of the visual surface.
#[derive(Clone, PartialEq)]
pub struct Snapshot {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl Snapshot {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: PNG_MIME_TYPE.to_string(),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Image(Snapshot),
    Text(String),
}

impl ToolPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolPayload::Text(text) => Some(text),
            ToolPayload::Image(_) => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ToolPayload::Image(_))
    }
}

/// Observation returned to the agent for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub invocation_id: String,
    pub tool_name: String,
    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn text(
        invocation_id: impl Into<String>,
        tool_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            payload: ToolPayload::Text(text.into()),
        }
    }

    pub fn image(
        invocation_id: impl Into<String>,
        tool_name: impl Into<String>,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            payload: ToolPayload::Image(snapshot),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Human {
        text: String,
    },
    Agent {
        text: Option<String>,
        tool_calls: Vec<ToolInvocation>,
    },
    ToolResult(ToolResult),
}

impl Message {
    pub fn human(text: impl Into<String>) -> Self {
        Message::Human { text: text.into() }
    }

    pub fn agent_text(text: impl Into<String>) -> Self {
        Message::Agent {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Message::Agent { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}
