//! Computer actions requested by the agent.
//!
//! Arguments arrive as loosely shaped JSON. Both the `action` style
//! (`left_click` with `coordinate: [x, y]`) and the `type` style
//! (`click` with `x`, `y`, `button`) are accepted. Anything that cannot be
//! turned into a concrete action becomes [`Action::Unsupported`], which the
//! dispatcher answers with a plain capture.

use std::time::Duration;

use serde::Deserialize;

use crate::surface::{MouseButton, Point};

pub const DEFAULT_SCROLL_AMOUNT: f64 = 100.0;
pub const DEFAULT_WAIT: Duration = Duration::from_secs(1);
const MAX_WAIT_SECS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Wheel deltas for scrolling `amount` pixels in this direction.
    pub fn deltas(self, amount: f64) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -amount),
            Self::Down => (0.0, amount),
            Self::Left => (-amount, 0.0),
            Self::Right => (amount, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Screenshot,
    Click { at: Point, button: MouseButton },
    DoubleClick { at: Point },
    TripleClick { at: Point },
    /// Press at the first point, move through the rest, release at the last.
    Drag { path: Vec<Point> },
    MouseDown { at: Point },
    MouseUp { at: Point },
    MouseMove { at: Point },
    Scroll { at: Point, delta_x: f64, delta_y: f64 },
    Type { text: String },
    /// A `+` separated chord such as `ctrl+a`.
    Key { chord: String },
    HoldKey { key: String },
    Wait { duration: Duration },
    Unsupported { name: String, reason: String },
}

impl Action {
    /// Short name used in logs and events.
    pub fn name(&self) -> &str {
        match self {
            Action::Screenshot => "screenshot",
            Action::Click { button, .. } => match button {
                MouseButton::Left => "left_click",
                MouseButton::Right => "right_click",
                MouseButton::Middle => "middle_click",
            },
            Action::DoubleClick { .. } => "double_click",
            Action::TripleClick { .. } => "triple_click",
            Action::Drag { .. } => "left_click_drag",
            Action::MouseDown { .. } => "left_mouse_down",
            Action::MouseUp { .. } => "left_mouse_up",
            Action::MouseMove { .. } => "mouse_move",
            Action::Scroll { .. } => "scroll",
            Action::Type { .. } => "type",
            Action::Key { .. } => "key",
            Action::HoldKey { .. } => "hold_key",
            Action::Wait { .. } => "wait",
            Action::Unsupported { name, .. } => name,
        }
    }

    /// Builds an action from tool arguments. Never fails.
    pub fn from_args(args: &serde_json::Value) -> Action {
        let parsed: ComputerArgs = match serde_json::from_value(args.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                let name = args
                    .get("action")
                    .or_else(|| args.get("type"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                return Action::Unsupported {
                    name,
                    reason: format!("malformed arguments: {e}"),
                };
            }
        };
        let name = parsed.action.clone().unwrap_or_default();
        parsed.into_action().unwrap_or_else(|reason| Action::Unsupported {
            name: if name.is_empty() {
                "unknown".to_string()
            } else {
                name
            },
            reason,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathPoint {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

#[derive(Debug, Default, Deserialize)]
struct ComputerArgs {
    #[serde(alias = "type")]
    action: Option<String>,
    coordinate: Option<[f64; 2]>,
    x: Option<f64>,
    y: Option<f64>,
    start_coordinate: Option<[f64; 2]>,
    end_coordinate: Option<[f64; 2]>,
    path: Option<Vec<PathPoint>>,
    button: Option<String>,
    text: Option<String>,
    key: Option<String>,
    keys: Option<Vec<String>>,
    scroll_direction: Option<String>,
    scroll_amount: Option<f64>,
    scroll_x: Option<f64>,
    scroll_y: Option<f64>,
    duration: Option<f64>,
}

impl ComputerArgs {
    fn point(&self) -> Result<Point, String> {
        if let Some([x, y]) = self.coordinate {
            return Ok(Point::new(x, y));
        }
        match (self.x, self.y) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err("missing coordinate".to_string()),
        }
    }

    fn key_text(&self) -> Result<String, String> {
        if let Some(keys) = &self.keys {
            if !keys.is_empty() {
                return Ok(keys.join("+"));
            }
        }
        self.key
            .clone()
            .or_else(|| self.text.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "missing key".to_string())
    }

    fn into_action(self) -> Result<Action, String> {
        let Some(name) = self.action.as_deref() else {
            return Err("missing action".to_string());
        };
        let action = match name.trim().to_ascii_lowercase().as_str() {
            "screenshot" => Action::Screenshot,
            "left_click" => Action::Click {
                at: self.point()?,
                button: MouseButton::Left,
            },
            "right_click" => Action::Click {
                at: self.point()?,
                button: MouseButton::Right,
            },
            "middle_click" => Action::Click {
                at: self.point()?,
                button: MouseButton::Middle,
            },
            "click" => Action::Click {
                at: self.point()?,
                button: parse_button(self.button.as_deref())?,
            },
            "double_click" => Action::DoubleClick { at: self.point()? },
            "triple_click" => Action::TripleClick { at: self.point()? },
            "left_click_drag" | "drag" => Action::Drag {
                path: self.drag_path()?,
            },
            "left_mouse_down" => Action::MouseDown { at: self.point()? },
            "left_mouse_up" => Action::MouseUp { at: self.point()? },
            "mouse_move" | "move" => Action::MouseMove { at: self.point()? },
            "scroll" => {
                let at = self.point()?;
                let (delta_x, delta_y) = match (&self.scroll_direction, self.scroll_x, self.scroll_y)
                {
                    (Some(direction), _, _) => {
                        let direction = ScrollDirection::parse(direction)
                            .ok_or_else(|| format!("unknown scroll direction '{direction}'"))?;
                        let amount = self
                            .scroll_amount
                            .filter(|amount| *amount > 0.0)
                            .unwrap_or(DEFAULT_SCROLL_AMOUNT);
                        direction.deltas(amount)
                    }
                    (None, None, None) => return Err("missing scroll direction".to_string()),
                    (None, dx, dy) => (dx.unwrap_or(0.0), dy.unwrap_or(0.0)),
                };
                Action::Scroll {
                    at,
                    delta_x,
                    delta_y,
                }
            }
            "type" => Action::Type {
                text: self.text.ok_or_else(|| "missing text".to_string())?,
            },
            "key" | "keypress" => Action::Key {
                chord: self.key_text()?,
            },
            "hold_key" => Action::HoldKey {
                key: self.key_text()?,
            },
            "wait" => Action::Wait {
                duration: self
                    .duration
                    .filter(|secs| secs.is_finite() && *secs > 0.0)
                    .map(|secs| Duration::from_secs_f64(secs.min(MAX_WAIT_SECS)))
                    .unwrap_or(DEFAULT_WAIT),
            },
            other => {
                return Ok(Action::Unsupported {
                    name: other.to_string(),
                    reason: "unknown action".to_string(),
                })
            }
        };
        Ok(action)
    }

    fn drag_path(&self) -> Result<Vec<Point>, String> {
        if let (Some([sx, sy]), Some([ex, ey])) = (self.start_coordinate, self.end_coordinate) {
            return Ok(vec![Point::new(sx, sy), Point::new(ex, ey)]);
        }
        if let (Some([sx, sy]), Some([ex, ey])) = (self.start_coordinate, self.coordinate) {
            return Ok(vec![Point::new(sx, sy), Point::new(ex, ey)]);
        }
        match &self.path {
            Some(path) => Ok(path
                .iter()
                .map(|p| match p {
                    PathPoint::Pair([x, y]) => Point::new(*x, *y),
                    PathPoint::Object { x, y } => Point::new(*x, *y),
                })
                .collect()),
            None => Err("missing drag path".to_string()),
        }
    }
}

fn parse_button(value: Option<&str>) -> Result<MouseButton, String> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(MouseButton::Left),
        Some(v) => match v.as_str() {
            "left" | "" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" | "wheel" => Ok(MouseButton::Middle),
            other => Err(format!("unsupported mouse button '{other}'")),
        },
    }
}
