//! Generic TOML parsing with file path context.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into `T`.
///
/// Errors carry the file path, with the underlying I/O or TOML error kept as
/// the cause:
///
/// ```text
/// Failed to parse config file: /path/to/vellum.toml
/// Caused by:
///     invalid type: string "x", expected usize
/// ```
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
