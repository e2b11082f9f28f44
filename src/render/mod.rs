//! Rendering: block store, template inheritance and includes.
//!
//! [`BlockRenderer`] is the engine's entry point. Each [`render`] call opens a
//! fresh [`RenderSession`], executes the requested template inside an
//! implicit `content` block, then walks up the `@extends` chain, executing
//! each parent with the blocks the child defined. The final `content` block
//! is the rendered page.
//!
//! ```text
//! page.tpl.html                      layouts/app.tpl.html
//! @extends('layouts.app')            <title>@yield('title', 'Site')</title>
//! @section('title', 'Home')          <main>@yield('body')</main>
//! @section('body')
//!   Hello, {{ $name or 'Guest' }}!
//! @stop
//! ```
//!
//! [`render`]: BlockRenderer::render

mod executor;
mod session;

pub use session::{CONTENT_BLOCK, RenderSession};

use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

use crate::compiler::DirectiveCompiler;
use crate::config::ViewConfig;
use crate::core::{Context, Result, ViewError};
use crate::store::{ArtifactStore, FileArtifactStore, FileSourceStore, SourceStore};

/// Renders templates by name.
///
/// Stores are injected at construction; the renderer holds no per-render
/// state and can be shared across threads.
pub struct BlockRenderer {
    compiler: DirectiveCompiler,
    config: ViewConfig,
}

impl BlockRenderer {
    pub fn new(
        sources: Arc<dyn SourceStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: ViewConfig,
    ) -> Self {
        let compiler = DirectiveCompiler::new(sources, artifacts, config.echo_format.clone());
        Self {
            compiler,
            config,
        }
    }

    /// Build a renderer over the configured views and cache directories.
    pub fn from_config(config: ViewConfig) -> Result<Self> {
        config.validate()?;
        let sources = FileSourceStore::new(&config.views_dir, config.suffix.clone());
        let artifacts = FileArtifactStore::new(&config.cache_dir);
        tracing::debug!(
            "Views from {}, compiled artifacts in {}",
            config.views_dir.display(),
            config.cache_dir.display()
        );
        Ok(Self::new(Arc::new(sources), Arc::new(artifacts), config))
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn compiler(&self) -> &DirectiveCompiler {
        &self.compiler
    }

    /// A fresh session for driving blocks by hand.
    pub fn session(&self) -> RenderSession<'_> {
        RenderSession::new(self)
    }

    /// Render `name` with `data`, following its inheritance chain.
    pub fn render(&self, name: &str, data: &Context) -> Result<String> {
        self.session().run(name, data)
    }

    /// Render with any serializable data that encodes as a JSON object.
    pub fn retrieve<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        let value = serde_json::to_value(data).map_err(|e| ViewError::Evaluation {
            template: name.to_string(),
            line: 0,
            message: format!("render data does not serialize: {e}"),
        })?;
        let context = Context::from_value(value).ok_or_else(|| ViewError::Evaluation {
            template: name.to_string(),
            line: 0,
            message: "render data must be an object of named values".to_string(),
        })?;
        self.render(name, &context)
    }

    /// Render into `writer`. Nothing is written unless the render succeeds.
    pub fn render_to<W: Write + ?Sized>(&self, name: &str, data: &Context, writer: &mut W) -> Result<()> {
        let text = self.render(name, data)?;
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|source| ViewError::Output {
                source,
            })
    }

    /// Whether `name` resolves to a template source.
    pub fn exists(&self, name: &str) -> bool {
        self.compiler.sources().exists(name)
    }

    /// Delete every compiled artifact, returning how many were removed.
    pub fn cleanup(&self) -> Result<usize> {
        self.compiler.artifacts().clear()
    }
}
