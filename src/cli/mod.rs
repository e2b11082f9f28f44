//! Command-line interface for Vellum.
//!
//! The `vellum` binary drives the engine outside of a host application:
//! rendering templates with JSON data, forcing recompilation, checking
//! freshness and clearing the artifact cache.
//!
//! # Commands
//!
//! - `render <name>` - render a template to stdout
//! - `compile <name>` - recompile a template and store the artifact
//! - `check <name>` - report whether a template exists and is fresh
//! - `clear` - delete every compiled artifact
//!
//! # Global Options
//!
//! - `--config <FILE>` - TOML configuration (default `vellum.toml` if present)
//! - `--views <DIR>` / `--cache <DIR>` - override the configured directories
//! - `--verbose` / `--quiet` - log level (debug / off)
//!
//! # Examples
//!
//! ```bash
//! vellum render pages.home --data home.json --set title=Welcome
//! vellum --views resources/views compile layouts.app --print
//! vellum clear
//! ```

mod check;
mod clear;
pub mod common;
mod compile;
mod render;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter to install; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
    pub views_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber for this process.
    ///
    /// Logs go to stderr so rendered output on stdout stays clean.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "vellum",
    about = "Vellum - compile and render directive-based templates",
    version,
    long_about = "Vellum compiles templates with @directives and {{ echoes }} into cached programs and renders them with JSON data."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable all logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a vellum.toml configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Template source directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    views: Option<PathBuf>,

    /// Compiled artifact directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    cache: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template to stdout
    Render(render::RenderCommand),
    /// Recompile a template and store the artifact
    Compile(compile::CompileCommand),
    /// Check that a template exists and whether its artifact is fresh
    Check(check::CheckCommand),
    /// Delete every compiled artifact
    Clear(clear::ClearCommand),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config)
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("off".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            views_dir: self.views.clone(),
            cache_dir: self.cache.clone(),
        }
    }

    /// Run the selected command with an explicit configuration.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let renderer = common::build_renderer(&config)?;
        match self.command {
            Commands::Render(cmd) => cmd.execute(&renderer),
            Commands::Compile(cmd) => cmd.execute(&renderer),
            Commands::Check(cmd) => cmd.execute(&renderer),
            Commands::Clear(cmd) => cmd.execute(&renderer),
        }
    }
}
