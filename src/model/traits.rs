//! Traits for model clients.

use crate::model::types::{AgentRequest, AgentTurn, ModelError};

/// Core trait for agent model clients.
/// Implemented by the provider clients and by test doubles.
#[allow(async_fn_in_trait)]
pub trait AgentModelClient: Send + Sync {
    fn model_id(&self) -> String;
    async fn respond(&self, req: AgentRequest) -> Result<AgentTurn, ModelError>;
}
