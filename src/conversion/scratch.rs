//! Per-task scratch directories
//!
//! Every file's conversion owns one uuid-named subdirectory for its
//! intermediates (decoded WAV, cover, metadata text, resample attempts).
//! The directory is removed with its contents when the task ends, on the
//! success path and the failure path alike.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Scratch directory owned by a single conversion task
///
/// Dropping the guard removes the directory and everything in it.
#[derive(Debug)]
pub struct TaskScratch {
    dir: PathBuf,
}

impl TaskScratch {
    /// Create a fresh scratch subdirectory under `root`
    pub fn create(root: &Path) -> Result<Self, String> {
        let dir = root.join(format!("task-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create scratch directory {:?}: {}", dir, e))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of a named intermediate inside this scratch directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for TaskScratch {
    fn drop(&mut self) {
        // Removal failure only leaks temp files; nothing useful to do
        // about it during unwind.
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
