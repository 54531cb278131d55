//! Provider-specific client implementations.

pub mod anthropic;
pub mod openai_compat;

use crate::model::{AgentModelClient, AgentRequest, AgentTurn, ModelError, ProviderId};

pub use anthropic::AnthropicClient;
pub use openai_compat::OpenAiCompatClient;

/// Client selected at startup from configuration.
pub enum PlayerModelClient {
    OpenAi(OpenAiCompatClient),
    Anthropic(AnthropicClient),
}

impl PlayerModelClient {
    pub fn new(
        provider: ProviderId,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        match provider {
            ProviderId::OpenAi => {
                PlayerModelClient::OpenAi(OpenAiCompatClient::new(api_key, model, base_url))
            }
            ProviderId::Anthropic => {
                PlayerModelClient::Anthropic(AnthropicClient::new(api_key, model, base_url))
            }
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            PlayerModelClient::OpenAi(_) => ProviderId::OpenAi,
            PlayerModelClient::Anthropic(_) => ProviderId::Anthropic,
        }
    }
}

impl AgentModelClient for PlayerModelClient {
    fn model_id(&self) -> String {
        match self {
            PlayerModelClient::OpenAi(client) => client.model_id(),
            PlayerModelClient::Anthropic(client) => client.model_id(),
        }
    }

    async fn respond(&self, req: AgentRequest) -> Result<AgentTurn, ModelError> {
        match self {
            PlayerModelClient::OpenAi(client) => client.respond(req).await,
            PlayerModelClient::Anthropic(client) => client.respond(req).await,
        }
    }
}
