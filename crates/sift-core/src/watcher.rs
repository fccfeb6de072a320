//! File watcher for the ingested document. Reloads it when it changes on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::notify::{self, RecommendedWatcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

use crate::document::{load_document, DocumentError};

const DEBOUNCE: Duration = Duration::from_millis(400);

/// Keeps the watch alive; dropping it stops watching.
pub struct DocumentWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    path: PathBuf,
}

impl DocumentWatcher {
    /// Canonical path of the watched document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Watches the document at `path` and calls `on_change` with its reloaded text
/// whenever it changes (debounced). The callback runs on the watcher's thread.
///
/// The parent directory is watched rather than the file itself, so editors that
/// save by writing a new file and renaming it over the old one still trigger a reload.
/// Events that leave the loaded outcome unchanged (including the reads done by the
/// reload itself) do not call `on_change`.
pub fn watch_document(
    path: &Path,
    on_change: impl Fn(Result<String, DocumentError>) + Send + 'static,
) -> Result<DocumentWatcher, WatchError> {
    if !path.is_file() {
        return Err(WatchError::NotAFile(path.to_path_buf()));
    }
    let path = path.canonicalize().map_err(WatchError::Canonicalize)?;
    let dir = path
        .parent()
        .ok_or_else(|| WatchError::NotAFile(path.clone()))?
        .to_path_buf();
    let target = path.clone();
    let mut last = outcome_key(&load_document(&path));

    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            if !events.iter().any(|e| e.path == target) {
                return;
            }
            let loaded = load_document(&target);
            let key = outcome_key(&loaded);
            if key == last {
                tracing::trace!(path = %target.display(), "document unchanged");
                return;
            }
            tracing::debug!(path = %target.display(), "document changed");
            last = key;
            on_change(loaded);
        }
        Err(e) => tracing::warn!(error = %e, "watcher error"),
    })
    .map_err(|e| WatchError::Notify(e.to_string()))?;

    debouncer
        .watcher()
        .watch(&dir, notify::RecursiveMode::NonRecursive)
        .map_err(|e| WatchError::Watch(e.to_string()))?;

    Ok(DocumentWatcher {
        _debouncer: debouncer,
        path,
    })
}

/// Comparable form of a load: the text, or the error message.
fn outcome_key(loaded: &Result<String, DocumentError>) -> Result<String, String> {
    match loaded {
        Ok(text) => Ok(text.clone()),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("not a file: {0}")]
    NotAFile(PathBuf),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("watcher init: {0}")]
    Notify(String),
    #[error("watch failed: {0}")]
    Watch(String),
}
