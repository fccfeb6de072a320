//! Location of Sift's `config.toml`.
//!
//! Nothing else is written there: documents are read from wherever the user keeps
//! them, and every corpus is rebuilt in memory on ingest.

use std::path::PathBuf;

/// Per-user directory holding `config.toml` (`~/.local/share/sift/` on Linux).
/// Created on first use; `None` when the platform has no home directory to anchor it.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Sift", "Sift")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
