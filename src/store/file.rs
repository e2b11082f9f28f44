//! File-backed stores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{Artifact, ArtifactLock, ArtifactStore, SourceStore, TemplateSource};
use crate::core::{Result, ViewError};
use crate::utils::{atomic_write, modified_time};

const ARTIFACT_EXTENSION: &str = "json";

/// Reads templates from a views directory.
///
/// Logical names use dots or slashes as separators: `emails.welcome` and
/// `emails/welcome` both resolve to `<views_dir>/emails/welcome<suffix>`.
#[derive(Debug, Clone)]
pub struct FileSourceStore {
    root: PathBuf,
    suffix: String,
}

impl FileSourceStore {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical name to its file path.
    ///
    /// Absolute names and names that would leave the views directory are
    /// rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = |reason: &str| ViewError::InvalidTemplateName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.starts_with(['/', '\\']) || name.contains(':') {
            return Err(invalid("absolute paths are not allowed"));
        }
        if name.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(invalid("parent directory segments are not allowed"));
        }
        if name.contains('\\') {
            return Err(invalid("use '.' or '/' to separate directories"));
        }

        let mut path = self.root.clone();
        let segments: Vec<&str> = name.split(['.', '/']).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty path segment"));
        }
        let (last, dirs) = segments.split_last().ok_or_else(|| invalid("name is empty"))?;
        path.extend(dirs);
        path.push(format!("{last}{}", self.suffix));
        Ok(path)
    }
}

impl SourceStore for FileSourceStore {
    fn read(&self, name: &str) -> Result<TemplateSource> {
        let path = self.path_for(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ViewError::TemplateNotFound {
                    name: name.to_string(),
                    path,
                });
            }
            Err(source) => {
                return Err(ViewError::SourceReadFailure {
                    path,
                    source,
                });
            }
        };
        let modified = self.modified(name)?;
        Ok(TemplateSource {
            text,
            modified,
        })
    }

    fn modified(&self, name: &str) -> Result<SystemTime> {
        let path = self.path_for(name)?;
        match modified_time(&path) {
            Ok(Some(modified)) => Ok(modified),
            Ok(None) => Err(ViewError::TemplateNotFound {
                name: name.to_string(),
                path,
            }),
            Err(source) => Err(ViewError::SourceReadFailure {
                path,
                source,
            }),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }
}

/// Stores compiled programs as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ARTIFACT_EXTENSION}"))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn read(&self, key: &str) -> Result<Option<Artifact>> {
        let path = self.path_for(key);
        let code = match fs::read_to_string(&path) {
            Ok(code) => code,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ViewError::CacheReadFailure {
                    path,
                    source,
                });
            }
        };
        Ok(self.modified(key)?.map(|modified| Artifact {
            code,
            modified,
        }))
    }

    fn modified(&self, key: &str) -> Result<Option<SystemTime>> {
        let path = self.path_for(key);
        modified_time(&path).map_err(|source| ViewError::CacheReadFailure {
            path,
            source,
        })
    }

    fn write(&self, key: &str, code: &str) -> Result<()> {
        let path = self.path_for(key);
        atomic_write(&path, code.as_bytes()).map_err(|source| ViewError::CacheWriteFailure {
            key: key.to_string(),
            path,
            source,
        })
    }

    fn clear(&self) -> Result<usize> {
        let read_failure = |source: io::Error| ViewError::CacheReadFailure {
            path: self.dir.clone(),
            source,
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(read_failure(e)),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(read_failure)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            fs::remove_file(&path).map_err(|source| ViewError::CacheWriteFailure {
                key: path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }
        tracing::debug!("Removed {removed} compiled artifact(s) from {}", self.dir.display());
        Ok(removed)
    }

    fn lock(&self, key: &str) -> Result<Option<ArtifactLock>> {
        ArtifactLock::acquire(&self.dir, key).map(Some)
    }
}
