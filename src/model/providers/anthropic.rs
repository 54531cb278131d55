//! Anthropic Messages API client.
//!
//! The API requires strictly alternating user/assistant turns, so tool
//! results and the human message that follows them are merged into one user
//! turn. Screenshots travel as `image` blocks inside `tool_result` blocks.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, ToolInvocation, ToolPayload};
use crate::model::{AgentModelClient, AgentRequest, AgentTurn, ModelError, ProviderId};

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let provider = ProviderId::Anthropic;
        Self {
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: base_url.unwrap_or_else(|| provider.default_base_url().to_string()),
            client: reqwest::Client::new(),
        }
    }

    async fn run_messages(
        &self,
        body: &AnthropicRequest,
    ) -> Result<(AnthropicResponse, String), ModelError> {
        let endpoint = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        tracing::debug!("anthropic API response: status={}", status);

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "anthropic auth failed ({status}). Check API key and account access."
            )));
        }
        if !status.is_success() {
            return Err(ModelError::Request(format!(
                "anthropic error {status}: {text}"
            )));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("anthropic parse failed: {e}")))?;
        Ok((parsed, text))
    }
}

impl AgentModelClient for AnthropicClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn respond(&self, req: AgentRequest) -> Result<AgentTurn, ModelError> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: req.system_prompt.clone(),
            messages: convert_messages(&req.messages),
            tools: req
                .tool_descriptors
                .iter()
                .map(|d| AnthropicTool {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    input_schema: d.input_schema.clone(),
                })
                .collect(),
        };
        let (response, raw) = self.run_messages(&body).await?;

        let mut text_parts = Vec::new();
        let mut calls = Vec::new();
        for block in response.content {
            match block {
                AnthropicBlock::Text { text } => text_parts.push(text),
                AnthropicBlock::ToolUse { id, name, input } => calls.push(ToolInvocation {
                    id,
                    name,
                    arguments: input,
                }),
                _ => {}
            }
        }
        let text = (!text_parts.is_empty()).then(|| text_parts.join("\n"));
        Ok(AgentTurn::from_parts(text, calls, Some(raw)))
    }
}

fn convert_messages(history: &[Message]) -> Vec<AnthropicMessage> {
    let mut out: Vec<AnthropicMessage> = Vec::new();
    for message in history {
        let (role, blocks) = match message {
            Message::Human { text } => ("user", vec![AnthropicBlock::Text { text: text.clone() }]),
            Message::Agent { text, tool_calls } => {
                let mut blocks = Vec::new();
                if let Some(text) = text.as_ref().filter(|t| !t.trim().is_empty()) {
                    blocks.push(AnthropicBlock::Text { text: text.clone() });
                }
                blocks.extend(tool_calls.iter().map(|call| AnthropicBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                }));
                if blocks.is_empty() {
                    blocks.push(AnthropicBlock::Text {
                        text: "(no response)".to_string(),
                    });
                }
                ("assistant", blocks)
            }
            Message::ToolResult(result) => {
                let content = match &result.payload {
                    ToolPayload::Text(text) => AnthropicBlock::Text { text: text.clone() },
                    ToolPayload::Image(snapshot) => AnthropicBlock::Image {
                        source: AnthropicImageSource {
                            source_type: "base64".to_string(),
                            media_type: snapshot.mime_type.clone(),
                            data: snapshot.to_base64(),
                        },
                    },
                };
                (
                    "user",
                    vec![AnthropicBlock::ToolResult {
                        tool_use_id: result.invocation_id.clone(),
                        content: vec![content],
                    }],
                )
            }
        };
        match out.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => out.push(AnthropicMessage {
                role: role.to_string(),
                content: blocks,
            }),
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    Image {
        source: AnthropicImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<AnthropicBlock>,
    },
    /// Blocks this client does not act on, such as thinking.
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}
