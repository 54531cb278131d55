use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::event_types::{
    EVENT_AGENT_MESSAGE, EVENT_GAME_ENDED, EVENT_RUN_PHASE, EVENT_TOOL_CALL_STARTED,
};
use super::RunEvent;

/// Prints the human-facing part of a run to stdout.
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Spawns the printer. It exits when the bus is dropped.
    pub fn start(mut rx: broadcast::Receiver<RunEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(line) = render(&event) {
                            println!("{line}");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("console reporter lagged, dropped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

fn render(event: &RunEvent) -> Option<String> {
    let payload = &event.payload;
    match event.event_type.as_str() {
        EVENT_AGENT_MESSAGE => payload["text"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .map(|text| format!("AI: {text}")),
        EVENT_TOOL_CALL_STARTED => {
            let tool = payload["tool_name"].as_str().unwrap_or("?");
            let detail = payload["summary"].as_str().unwrap_or_default();
            Some(format!("  -> {tool} {detail}").trim_end().to_string())
        }
        EVENT_GAME_ENDED => {
            let result = payload["result"].as_str().unwrap_or("unknown");
            Some(match payload["winner"].as_str() {
                Some(winner) => format!("Game over: {result} (winner {winner})"),
                None => format!("Game over: {result}"),
            })
        }
        EVENT_RUN_PHASE => payload["phase"]
            .as_str()
            .map(|phase| format!("== {phase} ==")),
        _ => None,
    }
}
