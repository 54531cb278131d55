//! Path jail for the memory directory.
//!
//! Agent-supplied paths are rooted at the memory directory: a leading `/`
//! means "the memory root", never the filesystem root. Paths that would
//! leave the root, lexically or through a symlink, are denied.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow(PathBuf),
    Deny(String),
}

#[derive(Debug, Clone)]
pub struct PathPolicy {
    root: PathBuf,
}

impl PathPolicy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an agent path such as `/strategy.md` to a location under the root.
    pub fn evaluate(&self, raw: &str) -> PolicyDecision {
        let relative = raw.strip_prefix('/').unwrap_or(raw);
        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return PolicyDecision::Deny(format!(
                        "path must not contain '..': {raw}"
                    ))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return PolicyDecision::Deny(format!(
                        "path escapes the memory directory: {raw}"
                    ))
                }
            }
        }

        if self.escapes_through_link(&resolved) {
            return PolicyDecision::Deny(format!("path escapes the memory directory: {raw}"));
        }
        PolicyDecision::Allow(resolved)
    }

    /// True when the nearest existing ancestor of `candidate` resolves to a
    /// location outside the canonical root.
    fn escapes_through_link(&self, candidate: &Path) -> bool {
        let Ok(root) = self.root.canonicalize() else {
            // Root not created yet; nothing under it can be a link.
            return false;
        };
        let mut ancestor = candidate.to_path_buf();
        loop {
            if ancestor.exists() {
                return match ancestor.canonicalize() {
                    Ok(canonical) => !canonical.starts_with(&root),
                    Err(_) => true,
                };
            }
            if !ancestor.pop() {
                return false;
            }
        }
    }
}
