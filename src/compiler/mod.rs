//! Template compilation and the compiled artifact cache.
//!
//! [`DirectiveCompiler`] turns template source into a [`Program`] in three
//! ordered passes, then folds the tokens into a node tree:
//!
//! 1. [`comments`]: `{{-- ... --}}` spans become inert comment tokens
//! 2. [`directives`]: `@name(args)` keywords become directive tokens
//! 3. [`echoes`]: `{{{ }}}`, `{!! !!}` and `{{ }}` become echo tokens
//!
//! Every pass only scans the text tokens left by the previous one.
//!
//! # Caching
//!
//! Programs are persisted in an [`ArtifactStore`] under the SHA-256 of the
//! template name. An artifact is reused while it is at least as new as its
//! source and decodes as a program of the current [`ARTIFACT_FORMAT`].
//! Otherwise the template is recompiled under the store's per-key lock and
//! written atomically. A process that waited for the lock checks freshness
//! again before compiling, so concurrent renders compile a template once.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vellum::compiler::DirectiveCompiler;
//! use vellum::config::EchoFormat;
//! use vellum::store::{MemoryArtifactStore, MemorySourceStore};
//!
//! let sources = Arc::new(MemorySourceStore::new().with("home", "Hi {{ $name }}"));
//! let compiler = DirectiveCompiler::new(
//!     sources,
//!     Arc::new(MemoryArtifactStore::new()),
//!     EchoFormat::default(),
//! );
//! let program = compiler.ensure_fresh("home")?;
//! assert_eq!(compiler.stats().compiled, 1);
//! # Ok::<(), vellum::core::ViewError>(())
//! ```

pub mod comments;
pub mod directives;
pub mod echoes;
pub mod program;
pub mod token;

pub use directives::Directive;
pub use program::{ARTIFACT_FORMAT, Branch, EndMode, Node, Program};
pub use token::Token;

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::EchoFormat;
use crate::core::{Result, ViewError};
use crate::store::{ArtifactStore, SourceStore};

/// Cache key for a template: hex SHA-256 of its logical name.
pub fn artifact_key(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

/// Counters for compilations and cache reuse.
#[derive(Debug, Default)]
struct CompileStats {
    compiled: AtomicUsize,
    reused: AtomicUsize,
}

/// Snapshot of [`DirectiveCompiler::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileCounts {
    /// Templates compiled from source
    pub compiled: usize,
    /// Fresh artifacts served from the store
    pub reused: usize,
}

pub struct DirectiveCompiler {
    sources: Arc<dyn SourceStore>,
    artifacts: Arc<dyn ArtifactStore>,
    echo_format: EchoFormat,
    stats: CompileStats,
}

impl DirectiveCompiler {
    pub fn new(
        sources: Arc<dyn SourceStore>,
        artifacts: Arc<dyn ArtifactStore>,
        echo_format: EchoFormat,
    ) -> Self {
        Self {
            sources,
            artifacts,
            echo_format,
            stats: CompileStats::default(),
        }
    }

    pub fn sources(&self) -> &dyn SourceStore {
        self.sources.as_ref()
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    pub fn stats(&self) -> CompileCounts {
        CompileCounts {
            compiled: self.stats.compiled.load(Ordering::Relaxed),
            reused: self.stats.reused.load(Ordering::Relaxed),
        }
    }

    /// Run the passes over `text` without touching any store.
    pub fn compile_source(&self, name: &str, text: &str) -> Result<Program> {
        let tokens = vec![Token::text(text, 1)];
        let tokens = comments::strip_comments(tokens);
        let tokens = directives::compile_directives(name, tokens)?;
        let tokens = echoes::compile_echoes(tokens, &self.echo_format);
        program::assemble(name, tokens)
    }

    /// Whether the stored artifact is missing or older than its source.
    pub fn is_expired(&self, name: &str) -> Result<bool> {
        let source_modified = self.sources.modified(name)?;
        Ok(match self.artifacts.modified(&artifact_key(name))? {
            Some(artifact_modified) => source_modified > artifact_modified,
            None => true,
        })
    }

    /// Recompile `name` unconditionally and persist the result.
    pub fn compile(&self, name: &str) -> Result<Program> {
        let key = artifact_key(name);
        let _lock = self.artifacts.lock(&key)?;
        self.compile_and_store(name, &key)
    }

    /// Return a fresh program for `name`, compiling only when the cached
    /// artifact is stale.
    pub fn ensure_fresh(&self, name: &str) -> Result<Program> {
        let key = artifact_key(name);
        if let Some(program) = self.fetch_fresh(name, &key)? {
            return Ok(program);
        }

        let _lock = self.artifacts.lock(&key)?;
        // another process may have compiled while we waited
        if let Some(program) = self.fetch_fresh(name, &key)? {
            return Ok(program);
        }
        self.compile_and_store(name, &key)
    }

    fn fetch_fresh(&self, name: &str, key: &str) -> Result<Option<Program>> {
        let source_modified = self.sources.modified(name)?;
        let Some(artifact) = self.artifacts.read(key)? else {
            tracing::debug!("No compiled artifact for '{name}'");
            return Ok(None);
        };
        if source_modified > artifact.modified {
            tracing::debug!("Compiled artifact for '{name}' is older than its source");
            return Ok(None);
        }
        match Program::from_code(&artifact.code) {
            Some(program) if program.template == name => {
                self.stats.reused.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Reusing compiled artifact for '{name}'");
                Ok(Some(program))
            }
            _ => {
                tracing::debug!("Compiled artifact for '{name}' is unusable, recompiling");
                Ok(None)
            }
        }
    }

    fn compile_and_store(&self, name: &str, key: &str) -> Result<Program> {
        let source = self.sources.read(name)?;
        let program = self.compile_source(name, &source.text)?;
        let code = program.to_code().map_err(|source| ViewError::ArtifactEncoding {
            template: name.to_string(),
            source,
        })?;
        self.artifacts.write(key, &code)?;
        self.stats.compiled.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Compiled '{name}' into artifact {key}");
        Ok(program)
    }
}
