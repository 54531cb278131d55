//! Routes the agent's tool invocations to the dispatcher, the memory store
//! and the game-end signal.

use serde_json::json;

use crate::bus::event_types::{
    CATEGORY_GAME, CATEGORY_TOOL, EVENT_GAME_ENDED, EVENT_TOOL_CALL_FINISHED,
    EVENT_TOOL_CALL_STARTED,
};
use crate::bus::EventBus;
use crate::core::message::{Message, ToolInvocation, ToolPayload, ToolResult};
use crate::dispatch::{self, Action, ActionDispatcher, DispatchError};
use crate::memory::command::MemoryCommand;
use crate::memory::MemoryStore;
use crate::runtime::game_end::{Declaration, GameEndReport, GameEndSignal};
use crate::tools::{ToolKind, ToolRegistry};

/// Everything a tool call may touch, borrowed from the controller for one
/// round.
pub(crate) struct ToolContext<'a> {
    pub registry: &'a ToolRegistry,
    pub dispatcher: &'a mut ActionDispatcher,
    pub memory: Option<&'a MemoryStore>,
    pub game_end: &'a mut GameEndSignal,
    pub bus: &'a EventBus,
}

/// Executes one invocation and returns the result to append to the history.
///
/// Only surface failures and desynchronized invocations are errors; every
/// other problem is reported to the agent as text.
pub(crate) async fn execute_tool_call(
    ctx: &mut ToolContext<'_>,
    history: &[Message],
    call: &ToolInvocation,
) -> Result<ToolResult, DispatchError> {
    ctx.bus.emit(
        CATEGORY_TOOL,
        EVENT_TOOL_CALL_STARTED,
        json!({
            "invocation_id": call.id,
            "tool_name": call.name,
            "tool_args": call.arguments,
            "summary": summarize(call),
        }),
    );

    let result = match ctx.registry.resolve(&call.name) {
        Some(ToolKind::Computer) => {
            let action = Action::from_args(&call.arguments);
            dispatch::correlate(history, &call.id)?;
            ctx.dispatcher.execute(&action, &call.id).await?
        }
        Some(ToolKind::Memory) => {
            let text = match ctx.memory {
                Some(store) => match MemoryCommand::from_args(&call.arguments) {
                    Ok(command) => store.execute(&command),
                    Err(message) => message,
                },
                None => "Error: Memory is disabled for this run".to_string(),
            };
            ToolResult::text(&call.id, &call.name, text)
        }
        Some(ToolKind::GameEnded) => {
            let text = match GameEndReport::from_args(&call.arguments) {
                Ok(report) => {
                    let declaration = ctx.game_end.declare(report);
                    let state = ctx.game_end.state();
                    ctx.bus.emit(
                        CATEGORY_GAME,
                        EVENT_GAME_ENDED,
                        json!({
                            "result": state.result,
                            "winner": state.winner,
                            "repeated": matches!(declaration, Declaration::AlreadyEnded(_)),
                        }),
                    );
                    declaration.text().to_string()
                }
                Err(message) => message,
            };
            ToolResult::text(&call.id, &call.name, text)
        }
        None => {
            tracing::warn!(tool = %call.name, "agent called an unknown tool");
            ToolResult::text(
                &call.id,
                &call.name,
                format!("Error: Unknown tool: {}", call.name),
            )
        }
    };

    ctx.bus.emit(
        CATEGORY_TOOL,
        EVENT_TOOL_CALL_FINISHED,
        json!({
            "invocation_id": call.id,
            "tool_name": call.name,
            "output": match &result.payload {
                ToolPayload::Text(text) => json!(text),
                ToolPayload::Image(snapshot) => json!({
                    "mime_type": snapshot.mime_type,
                    "bytes": snapshot.data.len(),
                }),
            },
        }),
    );
    Ok(result)
}

/// One-line description of a call for the console.
fn summarize(call: &ToolInvocation) -> String {
    let args = &call.arguments;
    let field = |key: &str| args.get(key).and_then(|v| v.as_str());
    match call.name.as_str() {
        dispatch::COMPUTER_TOOL => {
            let action = field("action").or_else(|| field("type")).unwrap_or("?");
            match args.get("coordinate").and_then(|v| v.as_array()) {
                Some(point) if point.len() == 2 => {
                    format!("{action} ({}, {})", point[0], point[1])
                }
                _ => action.to_string(),
            }
        }
        crate::memory::MEMORY_TOOL => {
            let command = field("command").unwrap_or("?");
            match field("path").or_else(|| field("old_path")) {
                Some(path) => format!("{command} {path}"),
                None => command.to_string(),
            }
        }
        _ => match field("result") {
            Some(result) => result.to_string(),
            None => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::surface::{SurfaceSession, SurfaceTarget, Viewport};
    use crate::testing::{FakeLauncher, SurfaceLog};

    struct Fixture {
        registry: ToolRegistry,
        dispatcher: ActionDispatcher,
        memory: MemoryStore,
        game_end: GameEndSignal,
        bus: EventBus,
        log: SurfaceLog,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(memory_enabled: bool) -> Self {
            let launcher = FakeLauncher::default();
            let log = launcher.log();
            let session = SurfaceSession::new(
                Box::new(launcher),
                SurfaceTarget {
                    url: "http://localhost:3000/".to_string(),
                    viewport: Viewport::default(),
                },
            );
            let dir = tempfile::tempdir().expect("tempdir");
            Self {
                registry: ToolRegistry::new(Viewport::default(), memory_enabled),
                dispatcher: ActionDispatcher::new(session, None),
                memory: MemoryStore::new(dir.path().join("memory")),
                game_end: GameEndSignal::default(),
                bus: EventBus::new(),
                log,
                _dir: dir,
            }
        }

        async fn run(&mut self, call: ToolInvocation) -> Result<ToolResult, DispatchError> {
            let history = vec![Message::Agent {
                text: None,
                tool_calls: vec![call.clone()],
            }];
            let memory_enabled = self.registry.resolve("memory").is_some();
            let mut ctx = ToolContext {
                registry: &self.registry,
                dispatcher: &mut self.dispatcher,
                memory: memory_enabled.then_some(&self.memory),
                game_end: &mut self.game_end,
                bus: &self.bus,
            };
            execute_tool_call(&mut ctx, &history, &call).await
        }
    }

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn computer_calls_return_a_capture() {
        let mut fixture = Fixture::new(false);
        let result = fixture
            .run(call(
                "call_1",
                "computer",
                json!({"action": "left_click", "coordinate": [600, 450]}),
            ))
            .await
            .expect("click");

        assert_eq!(result.invocation_id, "call_1");
        assert!(result.payload.is_image());
        assert_eq!(fixture.log.snapshot().captures, 1);
    }

    #[tokio::test]
    async fn computer_call_outside_latest_agent_message_is_desynchronized() {
        let mut fixture = Fixture::new(false);
        let stray = call("call_9", "computer", json!({"action": "screenshot"}));
        let history = vec![Message::human("play")];
        let mut ctx = ToolContext {
            registry: &fixture.registry,
            dispatcher: &mut fixture.dispatcher,
            memory: None,
            game_end: &mut fixture.game_end,
            bus: &fixture.bus,
        };

        let err = execute_tool_call(&mut ctx, &history, &stray)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Desynchronized { ref invocation_id } if invocation_id == "call_9"));
        assert_eq!(fixture.log.snapshot().captures, 0);
    }

    #[tokio::test]
    async fn memory_calls_return_text() {
        let mut fixture = Fixture::new(true);
        let created = fixture
            .run(call(
                "m1",
                "memory",
                json!({"command": "create", "path": "/strategy.md", "file_text": "take center"}),
            ))
            .await
            .expect("create");
        assert_eq!(created.payload.as_text(), Some("Successfully created file: /strategy.md"));

        let unknown = fixture
            .run(call("m2", "memory", json!({"command": "chmod", "path": "/x"})))
            .await
            .expect("unknown command");
        assert_eq!(unknown.payload.as_text(), Some("Unknown memory command: chmod"));
    }

    #[tokio::test]
    async fn memory_is_not_resolved_when_disabled() {
        let mut fixture = Fixture::new(false);
        let result = fixture
            .run(call("m1", "memory", json!({"command": "view"})))
            .await
            .expect("unknown tool is not fatal");
        assert_eq!(result.payload.as_text(), Some("Error: Unknown tool: memory"));
    }

    #[tokio::test]
    async fn game_ended_sets_the_signal_and_publishes() {
        let mut fixture = Fixture::new(false);
        let mut rx = fixture.bus.subscribe();

        let result = fixture
            .run(call("g1", "game_ended", json!({"result": "draw"})))
            .await
            .expect("game_ended");

        assert_eq!(result.payload.as_text(), Some("Game has ended. Result: draw"));
        assert!(fixture.game_end.has_ended());

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type);
        }
        assert_eq!(
            types,
            vec![EVENT_TOOL_CALL_STARTED, EVENT_GAME_ENDED, EVENT_TOOL_CALL_FINISHED]
        );
    }

    #[test]
    fn summaries_name_the_action_and_target() {
        assert_eq!(
            summarize(&call(
                "c",
                "computer",
                json!({"action": "left_click", "coordinate": [10, 20]})
            )),
            "left_click (10, 20)"
        );
        assert_eq!(
            summarize(&call("m", "memory", json!({"command": "view", "path": "/"}))),
            "view /"
        );
        assert_eq!(
            summarize(&call("g", "game_ended", json!({"result": "win"}))),
            "win"
        );
    }
}
