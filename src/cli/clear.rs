//! `vellum clear`: delete every compiled artifact.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::render::BlockRenderer;

#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub fn execute(self, renderer: &BlockRenderer) -> Result<()> {
        let removed = renderer.cleanup()?;
        println!(
            "{} Removed {removed} compiled artifact(s) from {}",
            "✓".green(),
            renderer.config().cache_dir.display()
        );
        Ok(())
    }
}
