//! Test utilities for Vellum
//!
//! Helpers shared by unit and integration tests: one-time logging setup and
//! [`ViewFixture`], a temporary views/cache directory pair with a renderer
//! wired to it.
//!
//! # Example
//!
//! ```rust,no_run
//! use vellum::core::Context;
//! use vellum::test_utils::ViewFixture;
//!
//! let fixture = ViewFixture::new().unwrap();
//! fixture.write("home", "Hello {{ $name }}").unwrap();
//! let mut data = Context::new();
//! data.insert("name", "Ada");
//! assert_eq!(fixture.renderer().unwrap().render("home", &data).unwrap(), "Hello Ada");
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::SystemTime;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::ViewConfig;
use crate::core::Result;
use crate::render::BlockRenderer;
use crate::store::FileSourceStore;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. With neither, logging
/// stays off.
///
/// ```bash
/// RUST_LOG=vellum=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Temporary `views/` and `cache/` directories for end-to-end tests.
///
/// Everything is removed when the fixture is dropped.
pub struct ViewFixture {
    temp_dir: TempDir,
    config: ViewConfig,
}

impl ViewFixture {
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let views_dir = temp_dir.path().join("views");
        let cache_dir = temp_dir.path().join("cache");
        fs::create_dir_all(&views_dir)?;

        let config = ViewConfig {
            views_dir,
            cache_dir,
            ..ViewConfig::default()
        };
        Ok(Self {
            temp_dir,
            config,
        })
    }

    /// Fixture with a customized configuration; directories are kept.
    pub fn with_config(mut self, configure: impl FnOnce(&mut ViewConfig)) -> Self {
        let (views_dir, cache_dir) = (self.config.views_dir.clone(), self.config.cache_dir.clone());
        configure(&mut self.config);
        self.config.views_dir = views_dir;
        self.config.cache_dir = cache_dir;
        self
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn views_dir(&self) -> &Path {
        &self.config.views_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    pub fn config(&self) -> ViewConfig {
        self.config.clone()
    }

    /// Path of the source file backing logical `name`.
    pub fn source_path(&self, name: &str) -> Result<PathBuf> {
        FileSourceStore::new(&self.config.views_dir, self.config.suffix.clone()).path_for(name)
    }

    /// Write template `name`, creating parent directories.
    pub fn write(&self, name: &str, text: &str) -> io::Result<PathBuf> {
        let path = self
            .source_path(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Set the modification time of template `name`'s source file.
    pub fn set_source_mtime(&self, name: &str, time: SystemTime) -> io::Result<()> {
        let path = self
            .source_path(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        fs::File::options().write(true).open(path)?.set_modified(time)
    }

    /// Number of compiled artifacts currently in the cache directory.
    pub fn artifact_count(&self) -> usize {
        fs::read_dir(&self.config.cache_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn renderer(&self) -> Result<BlockRenderer> {
        BlockRenderer::from_config(self.config())
    }
}
