//! The visual surface the agent plays on.
//!
//! A surface is anything that can show the game page, accept low-level
//! pointer and keyboard input, and return a PNG capture of what it shows.
//! The browser-backed implementation lives in [`chrome`]; tests drive the
//! dispatch layer against an in-memory fake.
//!
//! [`SurfaceSession`] owns at most one live surface. It is created lazily on
//! the first action and torn down by the controller when the run finishes.

pub mod archive;
pub mod chrome;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use archive::ScreenshotArchive;
pub use chrome::ChromeLauncher;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parses `WIDTHxHEIGHT`, e.g. `1200x900`.
    pub fn parse(value: &str) -> Option<Self> {
        let (width, height) = value.trim().split_once(|c: char| c == 'x' || c == 'X')?;
        let width = width.trim().parse().ok()?;
        let height = height.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200, 900)
    }
}

/// One low-level input step. Sequences of these are built by the dispatch
/// layer and replayed in order by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Move the pointer to `to`, taking `duration` to get there.
    PointerMove { to: Point, duration: Duration },
    PointerDown { button: MouseButton },
    PointerUp { button: MouseButton },
    Pause(Duration),
    Wheel { at: Point, delta_x: f64, delta_y: f64 },
    /// A single key. Either a named key (`Enter`, `Control`) or one character.
    Key(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to launch surface: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("input dispatch failed: {0}")]
    Input(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("surface task failed: {0}")]
    Task(String),
}

/// A live visual surface.
#[async_trait]
pub trait VisualSurface: Send {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError>;
    async fn resize(&mut self, viewport: Viewport) -> Result<(), SurfaceError>;
    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError>;
    /// Replays `events` in order.
    async fn dispatch(&mut self, events: &[SurfaceEvent]) -> Result<(), SurfaceError>;
    /// Releases every pointer button still held down.
    async fn release_all(&mut self) -> Result<(), SurfaceError>;
    async fn close(&mut self) -> Result<(), SurfaceError>;
}

/// Creates surfaces on demand.
#[async_trait]
pub trait SurfaceLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn VisualSurface>, SurfaceError>;
}

/// Where the session's surface points once it is created.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTarget {
    pub url: String,
    pub viewport: Viewport,
}

/// Lazily created, explicitly closed surface.
pub struct SurfaceSession {
    launcher: Box<dyn SurfaceLauncher>,
    target: SurfaceTarget,
    surface: Option<Box<dyn VisualSurface>>,
}

impl SurfaceSession {
    pub fn new(launcher: Box<dyn SurfaceLauncher>, target: SurfaceTarget) -> Self {
        Self {
            launcher,
            target,
            surface: None,
        }
    }

    pub fn target(&self) -> &SurfaceTarget {
        &self.target
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    /// Returns the live surface, launching and navigating it on first use.
    pub async fn surface(&mut self) -> Result<&mut (dyn VisualSurface + 'static), SurfaceError> {
        let surface = match self.surface.take() {
            Some(existing) => existing,
            None => self.launch().await?,
        };
        Ok(&mut **self.surface.insert(surface))
    }

    async fn launch(&self) -> Result<Box<dyn VisualSurface>, SurfaceError> {
        tracing::info!(
            url = %self.target.url,
            width = self.target.viewport.width,
            height = self.target.viewport.height,
            "opening game surface"
        );
        let mut surface = self.launcher.launch().await?;
        let prepared = async {
            surface.open(&self.target.url).await?;
            surface.resize(self.target.viewport).await
        }
        .await;
        if let Err(e) = prepared {
            if let Err(close_err) = surface.close().await {
                tracing::warn!("closing half-opened surface failed: {close_err}");
            }
            return Err(e);
        }
        Ok(surface)
    }

    /// Closes the surface if one was created. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), SurfaceError> {
        match self.surface.take() {
            Some(mut surface) => {
                tracing::info!("closing game surface");
                surface.close().await
            }
            None => Ok(()),
        }
    }
}
