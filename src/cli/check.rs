//! `vellum check`: existence, syntax and freshness of a template.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use crate::render::BlockRenderer;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Logical template name
    pub name: String,
}

impl CheckCommand {
    pub fn execute(self, renderer: &BlockRenderer) -> Result<()> {
        if !renderer.exists(&self.name) {
            bail!(
                "Template '{}' not found under {}",
                self.name,
                renderer.config().views_dir.display()
            );
        }

        let compiler = renderer.compiler();
        let source = compiler.sources().read(&self.name)?;
        compiler.compile_source(&self.name, &source.text)?;
        println!("{} {} compiles", "✓".green(), self.name.bold());

        if compiler.is_expired(&self.name)? {
            println!("{} compiled artifact is missing or stale", "!".yellow());
        } else {
            println!("{} compiled artifact is fresh", "✓".green());
        }
        Ok(())
    }
}
