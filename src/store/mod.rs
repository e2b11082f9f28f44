//! Template source and compiled artifact storage.
//!
//! The engine never touches the file system directly. Sources come from a
//! [`SourceStore`] and compiled programs go to an [`ArtifactStore`], both
//! injected when a [`BlockRenderer`](crate::render::BlockRenderer) is built.
//!
//! | Store | Backing | Use |
//! |---|---|---|
//! | [`FileSourceStore`] | `<views_dir>/a/b<suffix>` | production |
//! | [`FileArtifactStore`] | `<cache_dir>/<key>.json` | production |
//! | [`MemorySourceStore`] | `HashMap` | tests, embedding |
//! | [`MemoryArtifactStore`] | `HashMap` | tests |

mod file;
mod lock;
mod memory;

pub use file::{FileArtifactStore, FileSourceStore};
pub use lock::ArtifactLock;
pub use memory::{MemoryArtifactStore, MemorySourceStore};

use std::time::SystemTime;

use crate::core::Result;

/// Template text together with its modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub text: String,
    pub modified: SystemTime,
}

/// Resolves logical template names to source text.
pub trait SourceStore: Send + Sync {
    /// Read a template. A name that does not resolve is
    /// [`ViewError::TemplateNotFound`](crate::core::ViewError::TemplateNotFound).
    fn read(&self, name: &str) -> Result<TemplateSource>;

    /// Modification time without reading the text.
    fn modified(&self, name: &str) -> Result<SystemTime>;

    fn exists(&self, name: &str) -> bool;
}

/// Stored compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub code: String,
    pub modified: SystemTime,
}

/// Persists compiled programs by key.
pub trait ArtifactStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<Artifact>>;

    fn modified(&self, key: &str) -> Result<Option<SystemTime>>;

    /// Replace the artifact atomically; its modification time becomes now.
    fn write(&self, key: &str, code: &str) -> Result<()>;

    /// Remove every artifact, returning how many were removed.
    fn clear(&self) -> Result<usize>;

    /// Exclusive lock guarding recompilation of `key`, if the store needs one.
    fn lock(&self, _key: &str) -> Result<Option<ArtifactLock>> {
        Ok(None)
    }
}
