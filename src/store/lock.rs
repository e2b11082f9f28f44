//! Per-artifact file locking.
//!
//! Recompiling a template takes an exclusive lock on
//! `<cache_dir>/.locks/<key>.lock` so that two processes sharing a cache
//! directory never compile and write the same artifact at the same time. The
//! lock file itself is left in place; only the OS lock is released on drop.

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::core::{Result, ViewError};
use crate::utils::ensure_dir;

/// Exclusive lock on one artifact key, released when dropped.
#[derive(Debug)]
pub struct ArtifactLock {
    file: File,
    path: PathBuf,
}

impl ArtifactLock {
    /// Block until the lock for `key` under `cache_dir` is held.
    pub fn acquire(cache_dir: &Path, key: &str) -> Result<Self> {
        let locks_dir = cache_dir.join(".locks");
        let path = locks_dir.join(format!("{key}.lock"));
        let failure = |source: std::io::Error| ViewError::CacheWriteFailure {
            key: key.to_string(),
            path: path.clone(),
            source,
        };

        ensure_dir(&locks_dir).map_err(&failure)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(&failure)?;
        file.lock_exclusive().map_err(&failure)?;

        tracing::trace!("Acquired artifact lock {}", path.display());
        Ok(Self {
            file,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
