//! Common test utilities shared by the unit and integration suites.

// Not every suite uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::sync::Arc;

use vellum::config::ViewConfig;
use vellum::core::Context;
use vellum::render::BlockRenderer;
use vellum::store::{MemoryArtifactStore, MemorySourceStore};
use vellum::test_utils::ViewFixture;

/// Renderer over in-memory templates with the default configuration.
pub fn memory_renderer(templates: &[(&str, &str)]) -> BlockRenderer {
    memory_renderer_with(templates, ViewConfig::default())
}

pub fn memory_renderer_with(templates: &[(&str, &str)], config: ViewConfig) -> BlockRenderer {
    let sources = MemorySourceStore::new();
    for (name, text) in templates {
        sources.insert(*name, *text);
    }
    BlockRenderer::new(Arc::new(sources), Arc::new(MemoryArtifactStore::new()), config)
}

/// Render data from a JSON object literal.
pub fn data(value: Value) -> Context {
    Context::from_value(value).expect("test data must be a JSON object")
}

/// Collapse runs of whitespace so assertions ignore template layout.
pub fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `vellum` binary pointed at a fixture's views and cache directories.
pub fn vellum(fixture: &ViewFixture) -> Command {
    let mut cmd = Command::cargo_bin("vellum").unwrap();
    cmd.current_dir(fixture.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("VELLUM_VIEWS_DIR")
        .env_remove("VELLUM_CACHE_DIR")
        .arg("--views")
        .arg(fixture.views_dir())
        .arg("--cache")
        .arg(fixture.cache_dir());
    cmd
}
