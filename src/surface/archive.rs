//! Numbered copies of every capture, written to disk for later review.

use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ScreenshotArchive {
    dir: PathBuf,
    written: usize,
}

impl ScreenshotArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `png` as `screenshot-<n>.png`, numbering from 1.
    ///
    /// Failures are logged and swallowed; the archive never interrupts a game.
    pub fn record(&mut self, png: &[u8]) -> Option<PathBuf> {
        let path = self
            .dir
            .join(format!("screenshot-{}.png", self.written + 1));
        let written = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(&path, png));
        match written {
            Ok(()) => {
                self.written += 1;
                tracing::debug!(path = %path.display(), "screenshot archived");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to archive screenshot: {e}");
                None
            }
        }
    }
}
