//! Model clients for AI providers.
//!
//! ## Structure
//!
//! - `types`: request and response types (AgentRequest, AgentTurn, ModelError)
//! - `traits`: the client trait (AgentModelClient)
//! - `provider`: provider ID enum, parsing and defaults
//! - `providers/`: OpenAI-compatible and Anthropic implementations

pub mod provider;
pub mod providers;
pub mod traits;
pub mod types;

pub use provider::ProviderId;
pub use providers::PlayerModelClient;
pub use traits::AgentModelClient;
pub use types::{AgentAction, AgentRequest, AgentTurn, ModelError};
