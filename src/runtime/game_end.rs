//! The flag the agent raises when the game is over.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const GAME_ENDED_TOOL: &str = "game_ended";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameResult::Win => "win",
            GameResult::Loss => "loss",
            GameResult::Draw => "draw",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mark::X => "X",
            Mark::O => "O",
        })
    }
}

/// Arguments of a `game_ended` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndReport {
    pub result: GameResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Mark>,
}

impl GameEndReport {
    pub fn from_args(args: &serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(args.clone())
            .map_err(|e| format!("Error: Invalid game_ended arguments: {e}"))
    }

    fn describe(&self) -> String {
        match self.winner {
            Some(winner) => format!("Result: {}. Winner: {winner}", self.result),
            None => format!("Result: {}", self.result),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GameEndState {
    pub ended: bool,
    pub result: Option<GameResult>,
    pub winner: Option<Mark>,
}

/// What happened when a report was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Accepted(String),
    /// The game had already ended; the first report stands.
    AlreadyEnded(String),
}

impl Declaration {
    pub fn text(&self) -> &str {
        match self {
            Declaration::Accepted(text) | Declaration::AlreadyEnded(text) => text,
        }
    }
}

/// Run-scoped game end flag. It starts unset and, once set, keeps the first
/// report for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct GameEndSignal {
    state: GameEndState,
}

impl GameEndSignal {
    pub fn has_ended(&self) -> bool {
        self.state.ended
    }

    pub fn state(&self) -> GameEndState {
        self.state
    }

    pub(crate) fn declare(&mut self, report: GameEndReport) -> Declaration {
        if self.state.ended {
            let first = GameEndReport {
                result: self.state.result.unwrap_or(report.result),
                winner: self.state.winner,
            };
            tracing::warn!(
                first = %first.result,
                ignored = %report.result,
                "game already ended, ignoring repeated report"
            );
            return Declaration::AlreadyEnded(format!(
                "Game has already ended. {}",
                first.describe()
            ));
        }
        self.state = GameEndState {
            ended: true,
            result: Some(report.result),
            winner: report.winner,
        };
        tracing::info!(result = %report.result, winner = ?report.winner, "game ended");
        Declaration::Accepted(format!("Game has ended. {}", report.describe()))
    }
}
