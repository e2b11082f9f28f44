//! In-memory stores for tests and embedding.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use super::{Artifact, ArtifactStore, SourceStore, TemplateSource};
use crate::core::{Result, ViewError};

/// Templates held in a map, keyed by logical name.
#[derive(Debug, Default)]
pub struct MemorySourceStore {
    templates: RwLock<HashMap<String, TemplateSource>>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template; its modification time becomes now.
    pub fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        let source = TemplateSource {
            text: text.into(),
            modified: SystemTime::now(),
        };
        self.templates.write().unwrap_or_else(PoisonError::into_inner).insert(name.into(), source);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Override the modification time of an existing template.
    pub fn set_modified(&self, name: &str, modified: SystemTime) -> bool {
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        match templates.get_mut(name) {
            Some(source) => {
                source.modified = modified;
                true
            }
            None => false,
        }
    }

    fn not_found(name: &str) -> ViewError {
        ViewError::TemplateNotFound {
            name: name.to_string(),
            path: PathBuf::from(name),
        }
    }
}

impl SourceStore for MemorySourceStore {
    fn read(&self, name: &str) -> Result<TemplateSource> {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates.get(name).cloned().ok_or_else(|| Self::not_found(name))
    }

    fn modified(&self, name: &str) -> Result<SystemTime> {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates.get(name).map(|s| s.modified).ok_or_else(|| Self::not_found(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.templates.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }
}

/// Compiled artifacts held in a map.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Artifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Override the modification time of a stored artifact.
    pub fn set_modified(&self, key: &str, modified: SystemTime) -> bool {
        let mut artifacts = self.artifacts.write().unwrap_or_else(PoisonError::into_inner);
        match artifacts.get_mut(key) {
            Some(artifact) => {
                artifact.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Store raw code without going through the compiler.
    pub fn put(&self, key: &str, code: &str, modified: SystemTime) {
        let artifact = Artifact {
            code: code.to_string(),
            modified,
        };
        self.artifacts.write().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), artifact);
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, key: &str) -> Result<Option<Artifact>> {
        Ok(self.artifacts.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn modified(&self, key: &str) -> Result<Option<SystemTime>> {
        Ok(self.artifacts.read().unwrap_or_else(PoisonError::into_inner).get(key).map(|a| a.modified))
    }

    fn write(&self, key: &str, code: &str) -> Result<()> {
        self.put(key, code, SystemTime::now());
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let mut artifacts = self.artifacts.write().unwrap_or_else(PoisonError::into_inner);
        let removed = artifacts.len();
        artifacts.clear();
        Ok(removed)
    }
}
