//! File-backed memory the agent keeps between games.
//!
//! Every operation returns text for the agent. Failures are reported as
//! `Error: ...` strings rather than raised, so a bad memory call costs the
//! agent one turn and nothing more.

pub mod command;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::policy::{PathPolicy, PolicyDecision};

pub use command::MemoryCommand;

pub const MEMORY_TOOL: &str = "memory";

#[derive(Debug, thiserror::Error)]
enum MemoryError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Denied(String),
    #[error("String not found in file: \"{0}\"")]
    StringNotFound(String),
    #[error("Invalid line number: {0}")]
    InvalidLine(i64),
    #[error("Refusing to delete the memory directory itself")]
    DeleteRoot,
    #[error("{action} {path} failed: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

fn io_error<'a>(action: &'static str, path: &'a str) -> impl FnOnce(io::Error) -> MemoryError + 'a {
    move |source| MemoryError::Io {
        action,
        path: path.to_string(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    policy: PathPolicy,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            policy: PathPolicy::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.policy.root()
    }

    /// Runs one command and returns the agent-facing result text.
    pub fn execute(&self, command: &MemoryCommand) -> String {
        let outcome = fs::create_dir_all(self.root())
            .map_err(io_error("create", "/"))
            .and_then(|_| self.run(command));
        match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(target: "memory", command = command.name(), "{e}");
                format!("Error: {e}")
            }
        }
    }

    fn run(&self, command: &MemoryCommand) -> Result<String, MemoryError> {
        match command {
            MemoryCommand::View { path } => self.view(path.as_deref()),
            MemoryCommand::Create { path, file_text } => {
                self.create(path, file_text.as_deref().unwrap_or_default())
            }
            MemoryCommand::StrReplace {
                path,
                old_str,
                new_str,
            } => self.str_replace(
                path,
                old_str.as_deref().unwrap_or_default(),
                new_str.as_deref().unwrap_or_default(),
            ),
            MemoryCommand::Insert {
                path,
                insert_line,
                insert_text,
            } => self.insert(
                path,
                insert_line.unwrap_or(0),
                insert_text.as_deref().unwrap_or_default(),
            ),
            MemoryCommand::Rename { old_path, new_path } => self.rename(old_path, new_path),
            MemoryCommand::Delete { path } => self.delete(path),
        }
    }

    fn resolve(&self, raw: &str) -> Result<PathBuf, MemoryError> {
        match self.policy.evaluate(raw) {
            PolicyDecision::Allow(path) => Ok(path),
            PolicyDecision::Deny(reason) => Err(MemoryError::Denied(reason)),
        }
    }

    fn view(&self, path: Option<&str>) -> Result<String, MemoryError> {
        let Some(raw) = path.filter(|p| !p.is_empty() && *p != "/") else {
            let files = list_files(self.root()).map_err(io_error("list", "/"))?;
            if files.is_empty() {
                return Ok("Memory directory is empty. No game learnings stored yet.".to_string());
            }
            return Ok(format!("Memory files:\n{}", files.join("\n")));
        };

        let full = self.resolve(raw)?;
        if full.is_dir() {
            let files = list_files(&full).map_err(io_error("list", raw))?;
            if files.is_empty() {
                return Ok(format!("Directory {raw} is empty."));
            }
            return Ok(format!("Contents of {raw}:\n{}", files.join("\n")));
        }
        if !full.exists() {
            return Err(MemoryError::NotFound(raw.to_string()));
        }
        fs::read_to_string(&full).map_err(io_error("read", raw))
    }

    fn create(&self, raw: &str, text: &str) -> Result<String, MemoryError> {
        let full = self.resolve(raw)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(io_error("create", raw))?;
        }
        fs::write(&full, text).map_err(io_error("write", raw))?;
        tracing::info!(target: "memory", path = raw, "created");
        Ok(format!("Successfully created file: {raw}"))
    }

    fn str_replace(&self, raw: &str, old: &str, new: &str) -> Result<String, MemoryError> {
        let full = self.existing_file(raw)?;
        let content = fs::read_to_string(&full).map_err(io_error("read", raw))?;
        // An empty search string replaces nothing and still succeeds.
        if !old.is_empty() {
            if !content.contains(old) {
                return Err(MemoryError::StringNotFound(old.to_string()));
            }
            fs::write(&full, content.replacen(old, new, 1)).map_err(io_error("write", raw))?;
            tracing::info!(target: "memory", path = raw, "updated");
        }
        Ok(format!("Successfully replaced text in: {raw}"))
    }

    fn insert(&self, raw: &str, line: i64, text: &str) -> Result<String, MemoryError> {
        let full = self.existing_file(raw)?;
        let content = fs::read_to_string(&full).map_err(io_error("read", raw))?;
        let mut lines: Vec<&str> = content.split('\n').collect();
        let index = usize::try_from(line)
            .ok()
            .filter(|index| *index <= lines.len())
            .ok_or(MemoryError::InvalidLine(line))?;
        lines.insert(index, text);
        fs::write(&full, lines.join("\n")).map_err(io_error("write", raw))?;
        tracing::info!(target: "memory", path = raw, line, "inserted");
        Ok(format!("Successfully inserted text at line {line} in: {raw}"))
    }

    fn rename(&self, old_raw: &str, new_raw: &str) -> Result<String, MemoryError> {
        let from = self.resolve(old_raw)?;
        let to = self.resolve(new_raw)?;
        if !from.exists() {
            return Err(MemoryError::NotFound(old_raw.to_string()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(io_error("create", new_raw))?;
        }
        fs::rename(&from, &to).map_err(io_error("rename", old_raw))?;
        tracing::info!(target: "memory", from = old_raw, to = new_raw, "renamed");
        Ok(format!("Successfully renamed {old_raw} to {new_raw}"))
    }

    fn delete(&self, raw: &str) -> Result<String, MemoryError> {
        let full = self.resolve(raw)?;
        if full == self.root() {
            return Err(MemoryError::DeleteRoot);
        }
        if !full.exists() {
            return Err(MemoryError::NotFound(raw.to_string()));
        }
        if full.is_dir() {
            fs::remove_dir_all(&full).map_err(io_error("delete", raw))?;
        } else {
            fs::remove_file(&full).map_err(io_error("delete", raw))?;
        }
        tracing::info!(target: "memory", path = raw, "deleted");
        Ok(format!("Successfully deleted: {raw}"))
    }

    fn existing_file(&self, raw: &str) -> Result<PathBuf, MemoryError> {
        let full = self.resolve(raw)?;
        if !full.is_file() {
            return Err(MemoryError::NotFound(raw.to_string()));
        }
        Ok(full)
    }
}

/// Files under `dir`, depth first, as `/relative/path` sorted by name.
fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(dir, "", &mut files)?;
    Ok(files)
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<String>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let relative = format!("{prefix}/{name}");
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &relative, out)?;
        } else {
            out.push(relative);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, MemoryStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MemoryStore::new(dir.path().join("memory"));
        (dir, store)
    }

    fn run(store: &MemoryStore, args: serde_json::Value) -> String {
        match MemoryCommand::from_args(&args) {
            Ok(command) => store.execute(&command),
            Err(text) => text,
        }
    }

    #[test]
    fn empty_store_reports_no_learnings() {
        let (_dir, store) = store();
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/"})),
            "Memory directory is empty. No game learnings stored yet."
        );
        assert!(store.root().is_dir());
    }

    #[test]
    fn create_then_view_returns_exact_content() {
        let (_dir, store) = store();
        assert_eq!(
            run(
                &store,
                json!({"command": "create", "path": "/notes/strategy.md", "file_text": "take the centre\n"})
            ),
            "Successfully created file: /notes/strategy.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/notes/strategy.md"})),
            "take the centre\n"
        );
        assert_eq!(
            run(&store, json!({"command": "view"})),
            "Memory files:\n/notes/strategy.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/notes"})),
            "Contents of /notes:\n/strategy.md"
        );
    }

    #[test]
    fn listing_is_recursive_and_sorted() {
        let (_dir, store) = store();
        for path in ["/b.md", "/a/z.md", "/a/c.md"] {
            run(&store, json!({"command": "create", "path": path, "file_text": ""}));
        }
        run(&store, json!({"command": "create", "path": "/empty/x.md"}));
        run(&store, json!({"command": "delete", "path": "/empty/x.md"}));

        assert_eq!(
            run(&store, json!({"command": "view", "path": "/"})),
            "Memory files:\n/a/c.md\n/a/z.md\n/b.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/empty"})),
            "Directory /empty is empty."
        );
    }

    #[test]
    fn str_replace_changes_first_occurrence_only() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/log.md", "file_text": "win win"}),
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "str_replace", "path": "/log.md", "old_str": "win", "new_str": "loss"})
            ),
            "Successfully replaced text in: /log.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/log.md"})),
            "loss win"
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "str_replace", "path": "/log.md", "old_str": "draw", "new_str": "x"})
            ),
            "Error: String not found in file: \"draw\""
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "str_replace", "path": "/missing.md", "old_str": "a"})
            ),
            "Error: File not found: /missing.md"
        );
    }

    #[test]
    fn insert_at_line_count_appends() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/moves.md", "file_text": "a\nb"}),
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "insert", "path": "/moves.md", "insert_line": 2, "insert_text": "c"})
            ),
            "Successfully inserted text at line 2 in: /moves.md"
        );
        run(
            &store,
            json!({"command": "insert", "path": "/moves.md", "insert_line": 0, "insert_text": "start"}),
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/moves.md"})),
            "start\na\nb\nc"
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "insert", "path": "/moves.md", "insert_line": 9, "insert_text": "x"})
            ),
            "Error: Invalid line number: 9"
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "insert", "path": "/moves.md", "insert_line": -1, "insert_text": "x"})
            ),
            "Error: Invalid line number: -1"
        );
    }

    #[test]
    fn rename_moves_into_new_directories() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/draft.md", "file_text": "x"}),
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "rename", "old_path": "/draft.md", "new_path": "/archive/final.md"})
            ),
            "Successfully renamed /draft.md to /archive/final.md"
        );
        assert!(store.root().join("archive/final.md").is_file());
        assert!(!store.root().join("draft.md").exists());
        assert_eq!(
            run(
                &store,
                json!({"command": "rename", "old_path": "/draft.md", "new_path": "/b.md"})
            ),
            "Error: File not found: /draft.md"
        );
    }

    #[test]
    fn delete_removes_files_and_directories() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/old/a.md", "file_text": "x"}),
        );
        assert_eq!(
            run(&store, json!({"command": "delete", "path": "/old"})),
            "Successfully deleted: /old"
        );
        assert!(!store.root().join("old").exists());
        assert_eq!(
            run(&store, json!({"command": "delete", "path": "/old"})),
            "Error: File not found: /old"
        );
        assert!(run(&store, json!({"command": "delete", "path": "/"})).starts_with("Error:"));
        assert!(store.root().is_dir());
    }

    #[test]
    fn first_game_save_is_listed_and_readable() {
        let (_dir, store) = store();
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/"})),
            "Memory directory is empty. No game learnings stored yet."
        );
        assert_eq!(
            run(
                &store,
                json!({"command": "create", "path": "/strategy.md", "file_text": "take center"})
            ),
            "Successfully created file: /strategy.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/"})),
            "Memory files:\n/strategy.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/strategy.md"})),
            "take center"
        );
    }

    #[test]
    fn failed_edits_leave_the_file_untouched() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/moves.md", "file_text": "a\nb"}),
        );

        assert_eq!(
            run(
                &store,
                json!({"command": "insert", "path": "/moves.md", "insert_line": 3, "insert_text": "c"})
            ),
            "Error: Invalid line number: 3"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/moves.md"})),
            "a\nb"
        );

        assert_eq!(
            run(
                &store,
                json!({"command": "str_replace", "path": "/moves.md", "old_str": "z", "new_str": "y"})
            ),
            "Error: String not found in file: \"z\""
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/moves.md"})),
            "a\nb"
        );
    }

    #[test]
    fn renamed_file_is_only_visible_at_its_new_path() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/draft.md", "file_text": "corner first"}),
        );
        run(
            &store,
            json!({"command": "rename", "old_path": "/draft.md", "new_path": "/openings.md"}),
        );

        assert_eq!(
            run(&store, json!({"command": "view", "path": "/draft.md"})),
            "Error: File not found: /draft.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/openings.md"})),
            "corner first"
        );
    }

    #[test]
    fn deleting_a_directory_removes_its_descendants() {
        let (_dir, store) = store();
        run(
            &store,
            json!({"command": "create", "path": "/games/2024/first.md", "file_text": "x"}),
        );
        run(&store, json!({"command": "delete", "path": "/games"}));

        assert_eq!(
            run(&store, json!({"command": "view", "path": "/games/2024/first.md"})),
            "Error: File not found: /games/2024/first.md"
        );
        assert_eq!(
            run(&store, json!({"command": "view", "path": "/"})),
            "Memory directory is empty. No game learnings stored yet."
        );
    }

    #[test]
    fn paths_cannot_leave_the_memory_root() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("outside.md"), "secret").expect("write outside");

        let text = run(&store, json!({"command": "view", "path": "/../outside.md"}));
        assert!(text.starts_with("Error:"), "{text}");
        assert!(!text.contains("secret"));

        let text = run(
            &store,
            json!({"command": "create", "path": "../escape.md", "file_text": "x"}),
        );
        assert!(text.starts_with("Error:"), "{text}");
        assert!(!dir.path().join("escape.md").exists());
    }

    #[test]
    fn unknown_command_is_reported_not_raised() {
        let (_dir, store) = store();
        assert_eq!(
            run(&store, json!({"command": "undo", "path": "/x"})),
            "Unknown memory command: undo"
        );
    }
}
