//! In-memory doubles for the browser surface and the model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::model::{AgentModelClient, AgentRequest, AgentTurn, ModelError};
use crate::surface::{SurfaceError, SurfaceEvent, SurfaceLauncher, Viewport, VisualSurface};

/// PNG signature followed by a few bytes; enough to look like a capture.
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

/// What the fake surfaces saw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceRecord {
    pub launches: usize,
    pub opened: Vec<String>,
    pub resized: Vec<Viewport>,
    pub events: Vec<SurfaceEvent>,
    pub releases: usize,
    pub captures: usize,
    pub closes: usize,
}

/// Shared handle onto a [`SurfaceRecord`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog(Arc<Mutex<SurfaceRecord>>);

impl SurfaceLog {
    pub fn snapshot(&self) -> SurfaceRecord {
        self.0.lock().unwrap().clone()
    }

    fn record(&self, f: impl FnOnce(&mut SurfaceRecord)) {
        f(&mut self.0.lock().unwrap());
    }
}

/// Launches [`FakeSurface`]s. Set `fail_capture` to make every capture fail.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    log: SurfaceLog,
    pub fail_capture: bool,
}

impl FakeLauncher {
    pub fn log(&self) -> SurfaceLog {
        self.log.clone()
    }
}

#[async_trait]
impl SurfaceLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn VisualSurface>, SurfaceError> {
        self.log.record(|r| r.launches += 1);
        Ok(Box::new(FakeSurface {
            log: self.log.clone(),
            fail_capture: self.fail_capture,
        }))
    }
}

pub struct FakeSurface {
    log: SurfaceLog,
    fail_capture: bool,
}

#[async_trait]
impl VisualSurface for FakeSurface {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.log.record(|r| r.opened.push(url.to_string()));
        Ok(())
    }

    async fn resize(&mut self, viewport: Viewport) -> Result<(), SurfaceError> {
        self.log.record(|r| r.resized.push(viewport));
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError> {
        if self.fail_capture {
            return Err(SurfaceError::Capture("fake capture failure".to_string()));
        }
        self.log.record(|r| r.captures += 1);
        Ok(FAKE_PNG.to_vec())
    }

    async fn dispatch(&mut self, events: &[SurfaceEvent]) -> Result<(), SurfaceError> {
        self.log.record(|r| r.events.extend_from_slice(events));
        Ok(())
    }

    async fn release_all(&mut self) -> Result<(), SurfaceError> {
        self.log.record(|r| r.releases += 1);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        self.log.record(|r| r.closes += 1);
        Ok(())
    }
}

/// Model that replays a fixed script of turns and records every request.
/// Running past the end of the script is a request error.
#[derive(Clone, Default)]
pub struct ScriptedAgent {
    script: Arc<Mutex<VecDeque<Result<AgentTurn, ModelError>>>>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl ScriptedAgent {
    pub fn new(script: impl IntoIterator<Item = Result<AgentTurn, ModelError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl AgentModelClient for ScriptedAgent {
    fn model_id(&self) -> String {
        "scripted".to_string()
    }

    async fn respond(&self, req: AgentRequest) -> Result<AgentTurn, ModelError> {
        self.requests.lock().unwrap().push(req);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Request("script exhausted".to_string())))
    }
}
