//! Keeps an on-disk file and its in-memory document in step, so that saves
//! made by an external editor show up as typing activity.

use crate::state::ApiState;
use codebud_core::{split_lines_inclusive, CodebudError, Position, Result, TextDocument};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use similar::{DiffTag, TextDiff};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct FileMirror {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl FileMirror {
    /// Opens `path` as the focused document and follows changes to it.
    /// Must be called from within a tokio runtime.
    pub fn watch(path: &Path, state: Arc<ApiState>) -> Result<Self> {
        let path = path.canonicalize()?;
        let text = std::fs::read_to_string(&path)?;
        state.open_document(TextDocument::new(uri_for(&path), &text));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) => {
                    let _ = tx.send(event.paths);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "File watch error"),
            },
            Config::default(),
        )
        .map_err(|e| CodebudError::Other(format!("Failed to create watcher: {e}")))?;

        // Editors often save by renaming a temp file over the original, which
        // only the parent directory sees.
        let parent = path.parent().unwrap_or(&path).to_path_buf();
        watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .map_err(|e| CodebudError::Other(format!("Failed to watch path: {e}")))?;

        let watched = path.clone();
        let task = tokio::spawn(async move {
            while let Some(paths) = rx.recv().await {
                if !paths.iter().any(|p| same_file(p, &watched)) {
                    continue;
                }
                match sync_from_disk(&state, &watched) {
                    Ok(0) => {}
                    Ok(edits) => tracing::debug!(edits, "Mirrored external change"),
                    Err(e) => tracing::warn!(error = %e, "Failed to mirror external change"),
                }
            }
        });

        tracing::info!(path = %path.display(), "Mirroring file");
        Ok(Self {
            path,
            _watcher: watcher,
            task,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileMirror {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn uri_for(path: &Path) -> String {
    path.display().to_string()
}

fn same_file(candidate: &Path, watched: &Path) -> bool {
    candidate == watched
        || candidate
            .canonicalize()
            .map(|c| c == watched)
            .unwrap_or(false)
}

/// Re-reads `path` and applies the line diff against its document as edits.
/// Returns how many edits were applied; zero when nothing changed.
pub fn sync_from_disk(state: &ApiState, path: &Path) -> Result<usize> {
    let new_text = std::fs::read_to_string(path)?;
    let uri = uri_for(path);

    let mut host = state.host();
    let old_text = host
        .document(&uri)
        .map(|d| d.text())
        .ok_or_else(|| CodebudError::Other(format!("Document not open: {uri}")))?;
    if old_text == new_text {
        return Ok(0);
    }

    // Diff over the document's own line model so hunk indices are line numbers.
    let old_lines = split_lines_inclusive(&old_text);
    let new_lines = split_lines_inclusive(&new_text);
    let diff = TextDiff::from_slices(&old_lines, &new_lines);
    let mut edits: Vec<_> = diff
        .ops()
        .iter()
        .map(|op| op.as_tag_tuple())
        .filter(|(tag, _, _)| *tag != DiffTag::Equal)
        .collect();

    // Bottom-up so earlier line numbers stay valid.
    edits.reverse();
    let mut last_line = None;
    for (_, old, new) in &edits {
        let replacement = new_lines
            .get(new.clone())
            .ok_or_else(|| CodebudError::Other(format!("Diff hunk out of range: {new:?}")))?
            .concat();
        host.apply_edit(
            &uri,
            Position::new(old.start, 0),
            Position::new(old.end, 0),
            &replacement,
        )?;
        last_line.get_or_insert(new.start);
    }
    // Cursor moves to the lowest changed line.
    let focused = host.active_uri() == Some(uri.as_str());
    if let (true, Some(line)) = (focused, last_line) {
        host.set_cursor(Position::new(line, 0));
    }

    state.refresh_diagnostics(&mut host);
    Ok(edits.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codebud_core::{EditorHost, ManualClock, ModeState};

    fn mirrored(text: &str) -> (tempfile::TempDir, PathBuf, ApiState) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        std::fs::write(&path, text).unwrap();
        let path = path.canonicalize().unwrap();

        let host = EditorHost::new(Arc::new(ManualClock::new(1_000)));
        let state = ApiState::new(host, ModeState::default());
        state.open_document(TextDocument::new(uri_for(&path), text));
        (dir, path, state)
    }

    #[test]
    fn test_unchanged_file_applies_nothing() {
        let (_dir, path, state) = mirrored("fn main() {}\n");
        assert_eq!(sync_from_disk(&state, &path).unwrap(), 0);
        assert!(state.host().tracker().is_empty());
    }

    #[test]
    fn test_external_edit_is_tracked_as_typing() {
        let (_dir, path, state) = mirrored("fn main() {\n}\n");
        std::fs::write(&path, "fn main() {\n    start();\n}\n").unwrap();

        assert_eq!(sync_from_disk(&state, &path).unwrap(), 1);

        let host = state.host();
        assert_eq!(
            host.active_document().unwrap().text(),
            "fn main() {\n    start();\n}\n"
        );
        let recent = host.tracker().recent_change_texts(5);
        assert_eq!(recent, vec!["start();".to_string()]);
        assert_eq!(host.cursor().unwrap().line, 1);
    }

    #[test]
    fn test_several_hunks_apply_bottom_up() {
        let (_dir, path, state) = mirrored("a\nb\nc\nd\ne\n");
        std::fs::write(&path, "A\nb\nc\nd\nE\nf\n").unwrap();

        let edits = sync_from_disk(&state, &path).unwrap();
        assert!(edits >= 2);
        assert_eq!(
            state.host().active_document().unwrap().text(),
            "A\nb\nc\nd\nE\nf\n"
        );
    }

    #[test]
    fn test_deleted_lines_are_removed() {
        let (_dir, path, state) = mirrored("keep\ndrop\nkeep too\n");
        std::fs::write(&path, "keep\nkeep too\n").unwrap();
        sync_from_disk(&state, &path).unwrap();
        assert_eq!(
            state.host().active_document().unwrap().text(),
            "keep\nkeep too\n"
        );
    }

    #[test]
    fn test_line_separator_char_keeps_hunks_on_their_line() {
        let (_dir, path, state) = mirrored("s = '\u{2028}'\na\nb\n");
        std::fs::write(&path, "s = '\u{2028}'\na\nc\n").unwrap();

        assert_eq!(sync_from_disk(&state, &path).unwrap(), 1);
        let host = state.host();
        assert_eq!(
            host.active_document().unwrap().text(),
            "s = '\u{2028}'\na\nc\n"
        );
        assert_eq!(host.cursor().unwrap().line, 2);
    }

    #[test]
    fn test_cr_only_file_is_mirrored() {
        let (_dir, path, state) = mirrored("one\rtwo\rthree\r");
        std::fs::write(&path, "one\rTWO\rthree\rfour\r").unwrap();

        assert!(sync_from_disk(&state, &path).unwrap() >= 1);
        let host = state.host();
        assert_eq!(
            host.active_document().unwrap().text(),
            "one\rTWO\rthree\rfour\r"
        );
        assert_eq!(host.cursor().unwrap().line, 3);
        assert_eq!(host.tracker().recent_change_texts(5), vec!["four", "TWO"]);
    }

    #[tokio::test]
    async fn test_watch_opens_the_file_as_focused_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let state = Arc::new(ApiState::default());
        let mirror = FileMirror::watch(&path, Arc::clone(&state)).unwrap();

        let host = state.host();
        let document = host.active_document().unwrap();
        assert_eq!(document.file_name(), "notes.py");
        assert_eq!(document.language_id(), "python");
        assert_eq!(mirror.path(), path.canonicalize().unwrap());
    }
}
