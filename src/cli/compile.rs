//! `vellum compile`: force recompilation of a template.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::compiler::artifact_key;
use crate::render::BlockRenderer;

#[derive(Args, Debug)]
pub struct CompileCommand {
    /// Logical template name
    pub name: String,

    /// Print the compiled program instead of a summary
    #[arg(long)]
    pub print: bool,
}

impl CompileCommand {
    pub fn execute(self, renderer: &BlockRenderer) -> Result<()> {
        let program = renderer.compiler().compile(&self.name)?;

        if self.print {
            println!("{}", serde_json::to_string_pretty(&program)?);
        } else {
            println!(
                "{} Compiled {} ({} top-level nodes) -> {}",
                "✓".green(),
                self.name.bold(),
                program.nodes.len(),
                artifact_key(&self.name)
            );
        }
        Ok(())
    }
}
