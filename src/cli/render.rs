//! `vellum render`: render a template to stdout.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::load_data;
use crate::render::BlockRenderer;

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Logical template name, e.g. `pages.home`
    pub name: String,

    /// JSON file with the render data (an object)
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Extra data as key=value; values are parsed as JSON when possible
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

impl RenderCommand {
    pub fn execute(self, renderer: &BlockRenderer) -> Result<()> {
        let data = load_data(self.data.as_ref(), &self.set)?;
        let stdout = std::io::stdout();
        renderer.render_to(&self.name, &data, &mut stdout.lock())?;
        tracing::debug!("Rendered '{}'", self.name);
        Ok(())
    }
}
