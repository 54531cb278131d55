pub mod controller;
pub mod game_end;
pub mod history;
pub mod prompts;
mod tools;

pub use controller::{
    ControllerError, ControllerSettings, GameController, GameOutcome, Phase, RunState,
};
pub use game_end::{GameEndSignal, GameEndState, GameResult, Mark};
