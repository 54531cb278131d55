//! Tic-tac-toe playing agent.
//!
//! An LLM plays the game in a browser page through a `computer` tool,
//! keeps notes between games with a `memory` tool and announces the result
//! with `game_ended`.
//!
//! # Architecture
//!
//! - `runtime`: turn loop, history and the game-end signal
//! - `dispatch`: maps agent actions onto pointer and keyboard input
//! - `surface`: the browser the game is shown in
//! - `memory`: file store rooted in one directory
//! - `policy`: keeps memory paths inside that directory
//! - `tools`: tool declarations sent to the model
//! - `model`: LLM API clients (OpenAI-compatible, Anthropic)
//! - `bus`: run events for the console
//! - `config`: environment and command-line settings
//! - `core`: shared message and tool types

pub mod bus;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod memory;
pub mod model;
pub mod policy;
pub mod runtime;
pub mod surface;
pub mod tools;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use bus::EventBus;
use config::PlayerConfig;
use dispatch::ActionDispatcher;
use memory::MemoryStore;
use model::PlayerModelClient;
use runtime::{ControllerError, GameController, GameOutcome};
use surface::{ChromeLauncher, ScreenshotArchive, SurfaceSession, SurfaceTarget};

/// Plays one game with the configured model and browser, publishing
/// progress on `bus`.
pub async fn run_game(
    config: PlayerConfig,
    bus: Arc<EventBus>,
) -> Result<GameOutcome, ControllerError> {
    let model = PlayerModelClient::new(
        config.provider,
        config.api_key,
        config.model,
        config.base_url,
    );
    tracing::info!(provider = %model.provider(), game_url = %config.game_url, "configured player");

    let session = SurfaceSession::new(
        Box::new(ChromeLauncher::new(config.headless, config.viewport)),
        SurfaceTarget {
            url: config.game_url,
            viewport: config.viewport,
        },
    );
    let archive = config.screenshot_dir.map(ScreenshotArchive::new);
    if let Some(archive) = &archive {
        tracing::info!(dir = %archive.dir().display(), "archiving screenshots");
    }
    let dispatcher = ActionDispatcher::new(session, archive);
    let memory = config
        .memory_enabled
        .then(|| MemoryStore::new(config.memory_dir));

    GameController::new(model, dispatcher, memory, bus, config.controller)
        .run()
        .await
}
