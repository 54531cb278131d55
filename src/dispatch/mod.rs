//! Turns agent actions into input on the visual surface.
//!
//! Every action, including unknown ones, is answered with a fresh capture of
//! the surface. [`plan`] is the pure part: it maps an [`Action`] to the input
//! sequence to replay. [`ActionDispatcher`] replays it and captures.

pub mod action;
pub mod keys;

use std::time::Duration;

use crate::core::message::{Message, Snapshot, ToolResult};
use crate::surface::{
    MouseButton, Point, ScreenshotArchive, SurfaceError, SurfaceEvent, SurfaceSession, Viewport,
};

pub use action::Action;

pub const COMPUTER_TOOL: &str = "computer";

const APPROACH: Duration = Duration::from_millis(100);
const CLICK_HOLD: Duration = Duration::from_millis(50);
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(50);
const TRIPLE_CLICK_GAP: Duration = Duration::from_millis(30);
const DRAG_SEGMENT: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("tool invocation '{invocation_id}' does not match the latest agent message")]
    Desynchronized { invocation_id: String },
}

/// Input sequence for one action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionPlan {
    pub events: Vec<SurfaceEvent>,
    /// Release all held pointer buttons after replaying `events`.
    pub release_after: bool,
    /// Time to wait before capturing.
    pub settle: Option<Duration>,
}

pub fn plan(action: &Action) -> ActionPlan {
    use SurfaceEvent::*;

    let approach = |at: Point| PointerMove {
        to: at,
        duration: APPROACH,
    };
    let press = || PointerDown {
        button: MouseButton::Left,
    };
    let release = || PointerUp {
        button: MouseButton::Left,
    };
    let pointer = |events: Vec<SurfaceEvent>| ActionPlan {
        events,
        release_after: true,
        settle: None,
    };
    let keyboard = |events: Vec<SurfaceEvent>| ActionPlan {
        events,
        release_after: false,
        settle: None,
    };

    match action {
        Action::Screenshot => ActionPlan::default(),
        Action::Click { at, button } => pointer(vec![
            approach(*at),
            PointerDown { button: *button },
            PointerMove {
                to: *at,
                duration: CLICK_HOLD,
            },
            PointerUp { button: *button },
        ]),
        Action::DoubleClick { at } => pointer(vec![
            approach(*at),
            press(),
            release(),
            Pause(DOUBLE_CLICK_GAP),
            press(),
            release(),
        ]),
        Action::TripleClick { at } => pointer(vec![
            approach(*at),
            press(),
            release(),
            Pause(TRIPLE_CLICK_GAP),
            press(),
            release(),
            Pause(TRIPLE_CLICK_GAP),
            press(),
            release(),
        ]),
        Action::Drag { path } => match path.as_slice() {
            [first, rest @ ..] if !rest.is_empty() => {
                let mut events = vec![approach(*first), press()];
                events.extend(rest.iter().map(|at| PointerMove {
                    to: *at,
                    duration: DRAG_SEGMENT,
                }));
                events.push(release());
                pointer(events)
            }
            // Fewer than two points: nothing to drag, just capture.
            _ => ActionPlan::default(),
        },
        Action::MouseDown { at } => ActionPlan {
            events: vec![approach(*at), press()],
            release_after: false,
            settle: None,
        },
        Action::MouseUp { at } => pointer(vec![approach(*at), release()]),
        Action::MouseMove { at } => pointer(vec![approach(*at)]),
        Action::Scroll {
            at,
            delta_x,
            delta_y,
        } => pointer(vec![Wheel {
            at: *at,
            delta_x: *delta_x,
            delta_y: *delta_y,
        }]),
        Action::Type { text } => keyboard(text.chars().map(|c| Key(c.to_string())).collect()),
        Action::Key { chord } => keyboard(keys::resolve_chord(chord).into_iter().map(Key).collect()),
        Action::HoldKey { key } => keyboard(vec![Key(keys::resolve(key))]),
        Action::Wait { duration } => ActionPlan {
            settle: Some(*duration),
            ..ActionPlan::default()
        },
        Action::Unsupported { .. } => ActionPlan::default(),
    }
}

/// Checks that `invocation_id` belongs to the most recent agent message.
///
/// Results must answer the call that produced them; an id that is not among
/// the latest agent message's tool calls means history and execution have
/// drifted apart.
pub fn correlate(history: &[Message], invocation_id: &str) -> Result<(), DispatchError> {
    let latest = history
        .iter()
        .rev()
        .find(|message| matches!(message, Message::Agent { .. }));
    let known = latest
        .map(|message| {
            message
                .tool_calls()
                .iter()
                .any(|call| call.id == invocation_id)
        })
        .unwrap_or(false);
    if invocation_id.is_empty() || !known {
        return Err(DispatchError::Desynchronized {
            invocation_id: invocation_id.to_string(),
        });
    }
    Ok(())
}

/// Replays actions on a lazily opened surface.
pub struct ActionDispatcher {
    session: SurfaceSession,
    archive: Option<ScreenshotArchive>,
}

impl ActionDispatcher {
    pub fn new(session: SurfaceSession, archive: Option<ScreenshotArchive>) -> Self {
        Self { session, archive }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Coordinate space the agent's pointer actions are expressed in.
    pub fn viewport(&self) -> Viewport {
        self.session.target().viewport
    }

    /// Performs `action` and returns the capture taken afterwards, tagged
    /// with `invocation_id`.
    pub async fn execute(
        &mut self,
        action: &Action,
        invocation_id: &str,
    ) -> Result<ToolResult, DispatchError> {
        log_action(action);
        let plan = plan(action);
        let surface = self.session.surface().await?;

        if !plan.events.is_empty() {
            surface.dispatch(&plan.events).await?;
        }
        if plan.release_after {
            surface.release_all().await?;
        }
        if let Some(settle) = plan.settle {
            tokio::time::sleep(settle).await;
        }
        let png = surface.capture().await?;

        if let Some(archive) = self.archive.as_mut() {
            archive.record(&png);
        }
        Ok(ToolResult::image(
            invocation_id,
            COMPUTER_TOOL,
            Snapshot::png(png),
        ))
    }

    /// Closes the surface if it was ever opened.
    pub async fn close(&mut self) -> Result<(), DispatchError> {
        self.session.close().await?;
        Ok(())
    }
}

fn log_action(action: &Action) {
    match action {
        Action::Click { at, .. }
        | Action::DoubleClick { at }
        | Action::TripleClick { at }
        | Action::MouseDown { at }
        | Action::MouseUp { at }
        | Action::MouseMove { at }
        | Action::Scroll { at, .. } => {
            tracing::info!(target: "dispatch", x = at.x, y = at.y, "{}", action.name());
        }
        Action::Drag { path } => {
            tracing::info!(target: "dispatch", points = path.len(), "{}", action.name());
        }
        Action::Type { text } => tracing::info!(target: "dispatch", text = %text, "type"),
        Action::Key { chord } => tracing::info!(target: "dispatch", chord = %chord, "key"),
        Action::HoldKey { key } => tracing::info!(target: "dispatch", key = %key, "hold_key"),
        Action::Wait { duration } => {
            tracing::info!(target: "dispatch", seconds = duration.as_secs_f64(), "wait");
        }
        Action::Screenshot => tracing::debug!(target: "dispatch", "screenshot"),
        Action::Unsupported { name, reason } => {
            tracing::warn!(target: "dispatch", action = %name, "unsupported action, capturing only: {reason}");
        }
    }
}
