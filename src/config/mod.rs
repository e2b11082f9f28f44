//! Engine configuration.
//!
//! [`ViewConfig`] controls where templates and compiled artifacts live, how
//! plain echoes are wrapped, and the limits that bound a single render.
//! It is usually read from a `vellum.toml`:
//!
//! ```toml
//! views_dir = "resources/views"
//! cache_dir = "storage/views"
//! suffix = ".tpl.html"
//! echo_format = "e({})"
//! strict_blocks = true
//! max_include_depth = 32
//! max_inheritance_depth = 16
//! max_loop_iterations = 100000
//! ```
//!
//! Every key is optional. `VELLUM_VIEWS_DIR` and `VELLUM_CACHE_DIR` override
//! the directories after the file is read.

mod parser;

pub use parser::parse_config;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::ViewError;

/// Environment variable overriding [`ViewConfig::views_dir`].
pub const VIEWS_DIR_ENV: &str = "VELLUM_VIEWS_DIR";
/// Environment variable overriding [`ViewConfig::cache_dir`].
pub const CACHE_DIR_ENV: &str = "VELLUM_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Root directory of template sources
    pub views_dir: PathBuf,
    /// Directory holding compiled artifacts
    pub cache_dir: PathBuf,
    /// File suffix appended to logical template names
    pub suffix: String,
    /// Wrapper applied to `{{ }}` echoes
    pub echo_format: EchoFormat,
    /// Fail instead of warn when a block is read while still open
    pub strict_blocks: bool,
    pub max_include_depth: usize,
    pub max_inheritance_depth: usize,
    /// Per-loop iteration cap
    pub max_loop_iterations: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            views_dir: PathBuf::from("views"),
            cache_dir: PathBuf::from("storage/views"),
            suffix: ".tpl.html".to_string(),
            echo_format: EchoFormat::default(),
            strict_blocks: false,
            max_include_depth: 32,
            max_inheritance_depth: 16,
            max_loop_iterations: 100_000,
        }
    }
}

impl ViewConfig {
    /// Read a TOML config file, then apply environment overrides and validate.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: Self = parse_config(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        tracing::debug!("Loaded view config from {}", path.display());
        Ok(config)
    }

    /// Apply directory overrides from `lookup` (normally the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(VIEWS_DIR_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!("{VIEWS_DIR_ENV} overrides views_dir: {dir}");
            self.views_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!("{CACHE_DIR_ENV} overrides cache_dir: {dir}");
            self.cache_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        let invalid = |message: String| Err(ViewError::InvalidConfig {
            message,
        });

        if self.views_dir.as_os_str().is_empty() {
            return invalid("views_dir must not be empty".into());
        }
        if self.cache_dir.as_os_str().is_empty() {
            return invalid("cache_dir must not be empty".into());
        }
        if self.suffix.contains(['/', '\\']) {
            return invalid(format!("suffix '{}' must not contain path separators", self.suffix));
        }
        for (key, value) in [
            ("max_include_depth", self.max_include_depth),
            ("max_inheritance_depth", self.max_inheritance_depth),
            ("max_loop_iterations", self.max_loop_iterations),
        ] {
            if value == 0 {
                return invalid(format!("{key} must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Wrapper for `{{ }}` echoes, with a single `{}` standing for the expression.
///
/// The default `e({})` HTML-escapes. `{}` alone prints raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EchoFormat(String);

impl EchoFormat {
    pub fn new(format: impl Into<String>) -> Result<Self, ViewError> {
        let format = format.into();
        if format.matches("{}").count() != 1 {
            return Err(ViewError::InvalidConfig {
                message: format!("echo_format '{format}' must contain exactly one '{{}}'"),
            });
        }
        Ok(Self(format))
    }

    /// Wrap an expression source.
    pub fn apply(&self, expr: &str) -> String {
        self.0.replacen("{}", expr, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EchoFormat {
    fn default() -> Self {
        Self("e({})".to_string())
    }
}

impl TryFrom<String> for EchoFormat {
    type Error = ViewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EchoFormat> for String {
    fn from(value: EchoFormat) -> Self {
        value.0
    }
}

impl fmt::Display for EchoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
