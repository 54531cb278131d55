//! Request and response types shared by the model clients.

use crate::core::message::{Message, ToolInvocation};
use crate::core::tool::ToolDescriptor;

/// Everything a client needs for one agent call.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub system_prompt: String,
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    pub tool_descriptors: Vec<ToolDescriptor>,
    /// Maximum tokens for the response. If None, uses the client default.
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Final text; ends the current invocation.
    Reply { text: String },
    /// Tools to run before calling the model again.
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolInvocation>,
    },
}

/// One model response.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub action: AgentAction,
    /// Raw response body, kept for debugging.
    pub raw_response: Option<String>,
}

impl AgentTurn {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            action: AgentAction::Reply { text: text.into() },
            raw_response: None,
        }
    }

    pub fn tool_calls(calls: Vec<ToolInvocation>) -> Self {
        Self {
            action: AgentAction::ToolCalls { text: None, calls },
            raw_response: None,
        }
    }

    /// Builds a turn from provider output. An empty call list is a reply.
    pub fn from_parts(
        text: Option<String>,
        calls: Vec<ToolInvocation>,
        raw_response: Option<String>,
    ) -> Self {
        let text = text.filter(|t| !t.trim().is_empty());
        let action = if calls.is_empty() {
            AgentAction::Reply {
                text: text.unwrap_or_default(),
            }
        } else {
            AgentAction::ToolCalls { text, calls }
        };
        Self {
            action,
            raw_response,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("auth error: {0}")]
    Auth(String),
}
