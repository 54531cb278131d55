//! Event categories and types published on the run bus.

pub const CATEGORY_RUN: &str = "run";
pub const CATEGORY_AGENT: &str = "agent";
pub const CATEGORY_TOOL: &str = "tool";
pub const CATEGORY_GAME: &str = "game";

pub const EVENT_RUN_PHASE: &str = "run.phase";
pub const EVENT_AGENT_DECIDING: &str = "agent.deciding";
pub const EVENT_AGENT_MESSAGE: &str = "agent.message";
pub const EVENT_TOOL_CALL_STARTED: &str = "tool.call_started";
pub const EVENT_TOOL_CALL_FINISHED: &str = "tool.call_finished";
pub const EVENT_GAME_ENDED: &str = "game.ended";
