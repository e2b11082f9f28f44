//! Helpers shared by the CLI commands.

use anyhow::{Context as _, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::CliConfig;
use crate::config::ViewConfig;
use crate::core::Context;
use crate::render::BlockRenderer;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "vellum.toml";

/// Resolve the effective [`ViewConfig`]: file (explicit or `vellum.toml`),
/// then environment, then command-line directory overrides.
pub fn load_config(cli: &CliConfig) -> Result<ViewConfig> {
    let mut config = match &cli.config_path {
        Some(path) => ViewConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            ViewConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => {
            let mut config = ViewConfig::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
    };

    if let Some(views) = &cli.views_dir {
        config.views_dir = views.clone();
    }
    if let Some(cache) = &cli.cache_dir {
        config.cache_dir = cache.clone();
    }
    config.validate()?;
    Ok(config)
}

pub fn build_renderer(cli: &CliConfig) -> Result<BlockRenderer> {
    let config = load_config(cli)?;
    Ok(BlockRenderer::from_config(config)?)
}

/// Build render data from an optional JSON file and `key=value` pairs.
///
/// Values given with `--set` are parsed as JSON when possible (`3`, `true`,
/// `[1,2]`) and used as plain strings otherwise.
pub fn load_data(file: Option<&PathBuf>, pairs: &[String]) -> Result<Context> {
    let mut data = match file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file: {}", path.display()))?;
            Context::from_json_str(&json)
                .with_context(|| format!("Invalid data file: {}", path.display()))?
        }
        None => Context::new(),
    };

    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Invalid --set value '{pair}': expected key=value");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid --set value '{pair}': key is empty");
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
        data.insert(key, value);
    }
    Ok(data)
}
