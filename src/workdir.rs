//! Scoped working-directory changes.
//!
//! The process working directory is the only piece of shared mutable state
//! in a backup run. Every in-place git invocation goes through [`ScopedDir`]
//! so the original directory is restored on all exit paths, including
//! panics and early returns.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Guard that switches the process working directory to a target path and
/// restores the previous one when dropped.
#[derive(Debug)]
pub struct ScopedDir {
    original: PathBuf,
}

impl ScopedDir {
    /// Switch the working directory to `path`, remembering the current one.
    pub fn enter(path: &Path) -> io::Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(path)?;
        Ok(Self { original })
    }

    /// The directory that will be restored on drop.
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.original) {
            tracing::warn!(
                "failed to restore working directory to {}: {}",
                self.original.display(),
                e
            );
        }
    }
}
