//! Whole-game scenarios driven by a scripted model against the fake surface.

use std::sync::Arc;

use serde_json::Value;

use crate::bus::EventBus;
use crate::core::message::ToolInvocation;
use crate::dispatch::ActionDispatcher;
use crate::memory::MemoryStore;
use crate::model::{AgentTurn, ModelError};
use crate::runtime::{ControllerSettings, GameController};
use crate::surface::{SurfaceSession, SurfaceTarget, Viewport};
use crate::testing::{FakeLauncher, ScriptedAgent, SurfaceLog};



pub fn call(id: &str, name: &str, arguments: Value) -> ToolInvocation {
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub fn calls(list: Vec<ToolInvocation>) -> Result<AgentTurn, ModelError> {
    Ok(AgentTurn::tool_calls(list))
}

pub fn reply(text: &str) -> Result<AgentTurn, ModelError> {
    Ok(AgentTurn::reply(text))
}

/// Controller wired to fakes, plus handles for inspecting what happened.
pub struct Harness {
    pub controller: GameController<ScriptedAgent>,
    pub agent: ScriptedAgent,
    pub surface: SurfaceLog,
    pub bus: Arc<EventBus>,
}

pub fn harness(
    script: Vec<Result<AgentTurn, ModelError>>,
    memory: Option<MemoryStore>,
    settings: ControllerSettings,
) -> Harness {
    let agent = ScriptedAgent::new(script);
    let launcher = FakeLauncher::default();
    let surface = launcher.log();
    let session = SurfaceSession::new(
        Box::new(launcher),
        SurfaceTarget {
            url: "http://localhost:3000/".to_string(),
            viewport: Viewport::default(),
        },
    );
    let bus = Arc::new(EventBus::with_run_id("test-run"));
    let controller = GameController::new(
        agent.clone(),
        ActionDispatcher::new(session, None),
        memory,
        bus.clone(),
        settings,
    );
    Harness {
        controller,
        agent,
        surface,
        bus,
    }
}
