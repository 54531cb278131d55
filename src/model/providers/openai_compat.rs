//! OpenAI-compatible Chat Completions client.
//!
//! Tool messages on this API carry text only, so screenshots are sent as
//! `image_url` parts of a user message placed right after the run of tool
//! messages they belong to.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, ToolInvocation, ToolPayload};
use crate::core::tool::ToolDescriptor;
use crate::model::{AgentModelClient, AgentRequest, AgentTurn, ModelError, ProviderId};

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct OpenAiCompatClient {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let provider = ProviderId::OpenAi;
        Self {
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: base_url.unwrap_or_else(|| provider.default_base_url().to_string()),
            client: reqwest::Client::new(),
        }
    }

    async fn run_chat(
        &self,
        body: &OpenAiChatRequest,
    ) -> Result<(OpenAiResponseMessage, String), ModelError> {
        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        tracing::debug!("openai API response: status={}", status);

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "openai auth failed ({status}). Check API key and account access."
            )));
        }
        if !status.is_success() {
            return Err(ModelError::Request(format!("openai error {status}: {text}")));
        }

        let parsed: OpenAiChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("openai parse failed: {e}")))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| {
                ModelError::InvalidResponse(
                    "missing choices[0].message from openai response".to_string(),
                )
            })?;
        Ok((message, text))
    }
}

impl AgentModelClient for OpenAiCompatClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn respond(&self, req: AgentRequest) -> Result<AgentTurn, ModelError> {
        let body = build_request(&self.model, &req);
        let (message, raw) = self.run_chat(&body).await?;

        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|call| call.tool_type == "function")
            .enumerate()
            .map(|(index, call)| {
                let arguments = serde_json::from_str::<serde_json::Value>(&call.function.arguments)
                    .unwrap_or_else(|e| {
                        tracing::warn!(
                            tool = %call.function.name,
                            "tool arguments are not valid JSON: {e}"
                        );
                        serde_json::json!({})
                    });
                ToolInvocation {
                    id: call.id.unwrap_or_else(|| format!("call_{index}")),
                    name: call.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(AgentTurn::from_parts(message.content, calls, Some(raw)))
    }
}

fn build_request(model: &str, req: &AgentRequest) -> OpenAiChatRequest {
    let tools: Vec<OpenAiTool> = req.tool_descriptors.iter().map(OpenAiTool::from).collect();
    let has_tools = !tools.is_empty();
    OpenAiChatRequest {
        model: model.to_string(),
        messages: convert_messages(&req.system_prompt, &req.messages),
        temperature: 0.1,
        max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        stream: false,
        tools: has_tools.then_some(tools),
        tool_choice: has_tools.then(|| "auto".to_string()),
    }
}

fn convert_messages(system: &str, history: &[Message]) -> Vec<OpenAiRequestMessage> {
    let mut out = vec![OpenAiRequestMessage::text("system", system)];
    let mut pending_images: Vec<OpenAiContentPart> = Vec::new();

    for message in history {
        if !matches!(message, Message::ToolResult(_)) {
            flush_images(&mut out, &mut pending_images);
        }
        match message {
            Message::Human { text } => out.push(OpenAiRequestMessage::text("user", text)),
            Message::Agent { text, tool_calls } => out.push(OpenAiRequestMessage {
                role: "assistant".to_string(),
                content: text.clone().map(OpenAiContent::Text),
                tool_calls: (!tool_calls.is_empty()).then(|| {
                    tool_calls
                        .iter()
                        .map(|call| OpenAiToolCall {
                            id: Some(call.id.clone()),
                            tool_type: "function".to_string(),
                            function: OpenAiFunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: None,
            }),
            Message::ToolResult(result) => {
                let content = match &result.payload {
                    ToolPayload::Text(text) => text.clone(),
                    ToolPayload::Image(snapshot) => {
                        pending_images.push(OpenAiContentPart::Text {
                            text: format!("Screenshot from tool call {}:", result.invocation_id),
                        });
                        pending_images.push(OpenAiContentPart::ImageUrl {
                            image_url: OpenAiImageUrl {
                                url: snapshot.data_url(),
                            },
                        });
                        "Screenshot captured; it is attached in the next message.".to_string()
                    }
                };
                out.push(OpenAiRequestMessage {
                    role: "tool".to_string(),
                    content: Some(OpenAiContent::Text(content)),
                    tool_calls: None,
                    tool_call_id: Some(result.invocation_id.clone()),
                });
            }
        }
    }
    flush_images(&mut out, &mut pending_images);
    out
}

fn flush_images(out: &mut Vec<OpenAiRequestMessage>, pending: &mut Vec<OpenAiContentPart>) {
    if pending.is_empty() {
        return;
    }
    out.push(OpenAiRequestMessage {
        role: "user".to_string(),
        content: Some(OpenAiContent::Parts(std::mem::take(pending))),
        tool_calls: None,
        tool_call_id: None,
    });
}

#[derive(Debug, Serialize)]
pub struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiRequestMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenAiTool {
    #[serde(rename = "type")]
    pub type_: String,
    pub function: OpenAiFunction,
}

impl From<&ToolDescriptor> for OpenAiTool {
    fn from(d: &ToolDescriptor) -> Self {
        OpenAiTool {
            type_: "function".to_string(),
            function: OpenAiFunction {
                name: d.name.clone(),
                description: d.description.clone(),
                parameters: d.input_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct OpenAiRequestMessage {
    pub role: String,
    pub content: Option<OpenAiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl OpenAiRequestMessage {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(OpenAiContent::Text(text.to_string())),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAiContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, Serialize)]
pub struct OpenAiImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiChatResponse {
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiResponseMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    pub function: OpenAiFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    pub arguments: String,
}
