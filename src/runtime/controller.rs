//! The turn loop that plays one game.
//!
//! A run moves through [`Phase`]s: an optional memory review, the opening
//! move, repeated "your turn" cycles until the agent raises the game-end
//! signal, and an optional memory save. Each phase is one agent invocation,
//! and an invocation keeps calling the model until it answers with text.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::bus::event_types::{
    CATEGORY_AGENT, CATEGORY_RUN, EVENT_AGENT_DECIDING, EVENT_AGENT_MESSAGE, EVENT_RUN_PHASE,
};
use crate::bus::EventBus;
use crate::core::message::Message;
use crate::dispatch::{ActionDispatcher, DispatchError};
use crate::memory::MemoryStore;
use crate::model::{AgentAction, AgentModelClient, AgentRequest, ModelError};
use crate::runtime::game_end::{GameEndSignal, GameEndState};
use crate::runtime::history::History;
use crate::runtime::prompts;
use crate::runtime::tools::{execute_tool_call, ToolContext};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 100;
pub const DEFAULT_KEEP_SNAPSHOTS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Tool rounds allowed in a single invocation before the run is aborted.
    pub max_tool_rounds: usize,
    /// Screenshots kept in model requests; `None` sends all of them.
    pub keep_snapshots: Option<usize>,
    pub max_tokens: Option<u32>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            keep_snapshots: Some(DEFAULT_KEEP_SNAPSHOTS),
            max_tokens: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("agent exceeded {limit} tool rounds in a single turn")]
    StepCeilingExceeded { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ReviewMemory,
    Opening,
    Playing,
    Ended,
    SavingMemory,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ReviewMemory => "review_memory",
            Phase::Opening => "opening",
            Phase::Playing => "playing",
            Phase::Ended => "ended",
            Phase::SavingMemory => "saving_memory",
            Phase::Done => "done",
        }
    }
}

/// Mutable state of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub game_end: GameEndSignal,
    pub history: History,
    pub tool_rounds: usize,
    pub agent_invocations: usize,
}

/// Summary returned when a run finishes.
#[derive(Debug)]
pub struct GameOutcome {
    pub state: GameEndState,
    pub agent_invocations: usize,
    pub tool_rounds: usize,
    pub history_len: usize,
    pub history: History,
}

pub struct GameController<M: AgentModelClient> {
    model: M,
    dispatcher: ActionDispatcher,
    memory: Option<MemoryStore>,
    registry: ToolRegistry,
    bus: Arc<EventBus>,
    settings: ControllerSettings,
    system_prompt: String,
    state: RunState,
}

impl<M: AgentModelClient> GameController<M> {
    /// Memory review and save are skipped, and the memory tool is not
    /// declared, when `memory` is `None`.
    pub fn new(
        model: M,
        dispatcher: ActionDispatcher,
        memory: Option<MemoryStore>,
        bus: Arc<EventBus>,
        settings: ControllerSettings,
    ) -> Self {
        let memory_enabled = memory.is_some();
        Self {
            registry: ToolRegistry::new(dispatcher.viewport(), memory_enabled),
            system_prompt: prompts::system_prompt(memory_enabled),
            model,
            dispatcher,
            memory,
            bus,
            settings,
            state: RunState::default(),
        }
    }

    /// Plays the game to the end. The surface is closed on every exit path.
    pub async fn run(mut self) -> Result<GameOutcome, ControllerError> {
        tracing::info!(
            model = %self.model.model_id(),
            run_id = %self.bus.run_id(),
            memory = self.memory.is_some(),
            "starting game"
        );
        let played = self.play().await;
        if let Err(e) = self.dispatcher.close().await {
            tracing::warn!("failed to close game surface: {e}");
        }
        if let Err(e) = &played {
            tracing::error!("run aborted: {e}");
        }
        played?;

        Ok(GameOutcome {
            state: self.state.game_end.state(),
            agent_invocations: self.state.agent_invocations,
            tool_rounds: self.state.tool_rounds,
            history_len: self.state.history.len(),
            history: self.state.history,
        })
    }

    async fn play(&mut self) -> Result<(), ControllerError> {
        if self.memory.is_some() {
            self.enter(Phase::ReviewMemory);
            self.invoke(prompts::MEMORY_REVIEW).await?;
        }

        self.enter(Phase::Opening);
        self.invoke(prompts::PLAY).await?;

        if !self.state.game_end.has_ended() {
            self.enter(Phase::Playing);
        }
        while !self.state.game_end.has_ended() {
            self.invoke(prompts::CONTINUE).await?;
        }
        self.enter(Phase::Ended);

        if self.memory.is_some() {
            self.enter(Phase::SavingMemory);
            self.invoke(prompts::GAME_END).await?;
        }
        self.enter(Phase::Done);
        Ok(())
    }

    fn enter(&self, phase: Phase) {
        tracing::debug!(phase = phase.as_str(), "entering phase");
        self.bus
            .emit(CATEGORY_RUN, EVENT_RUN_PHASE, json!({ "phase": phase }));
    }

    /// Sends `instruction` and runs tool rounds until the agent replies with
    /// text.
    async fn invoke(&mut self, instruction: &str) -> Result<(), ControllerError> {
        self.state.history.push(Message::human(instruction));
        self.state.agent_invocations += 1;
        let invocation = self.state.agent_invocations;
        let mut rounds = 0usize;

        loop {
            self.bus.emit(
                CATEGORY_AGENT,
                EVENT_AGENT_DECIDING,
                json!({ "invocation": invocation, "round": rounds }),
            );
            let request = AgentRequest {
                system_prompt: self.system_prompt.clone(),
                messages: self.state.history.pruned(self.settings.keep_snapshots),
                tool_descriptors: self.registry.list(),
                max_tokens: self.settings.max_tokens,
            };
            let turn = self.model.respond(request).await?;
            if let Some(raw) = &turn.raw_response {
                tracing::trace!(invocation, round = rounds, raw = %raw, "model response");
            }

            match turn.action {
                AgentAction::Reply { text } => {
                    self.announce(&text);
                    self.state.history.push(Message::agent_text(text));
                    return Ok(());
                }
                AgentAction::ToolCalls { text, calls } => {
                    rounds += 1;
                    if rounds > self.settings.max_tool_rounds {
                        return Err(ControllerError::StepCeilingExceeded {
                            limit: self.settings.max_tool_rounds,
                        });
                    }
                    self.state.tool_rounds += 1;
                    if let Some(text) = &text {
                        self.announce(text);
                    }
                    tracing::debug!(invocation, round = rounds, calls = calls.len(), "tool round");

                    self.state.history.push(Message::Agent {
                        text,
                        tool_calls: calls.clone(),
                    });
                    let mut ctx = ToolContext {
                        registry: &self.registry,
                        dispatcher: &mut self.dispatcher,
                        memory: self.memory.as_ref(),
                        game_end: &mut self.state.game_end,
                        bus: &self.bus,
                    };
                    for call in &calls {
                        let result =
                            execute_tool_call(&mut ctx, self.state.history.messages(), call)
                                .await?;
                        self.state.history.push(Message::ToolResult(result));
                    }
                }
            }
        }
    }

    fn announce(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        tracing::info!(target: "agent", "{text}");
        self.bus
            .emit(CATEGORY_AGENT, EVENT_AGENT_MESSAGE, json!({ "text": text }));
    }
}
