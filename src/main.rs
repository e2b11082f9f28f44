//! Vellum CLI entry point
//!
//! Parses arguments, installs logging and runs the selected command. Errors
//! are printed with context and suggestions, then the process exits with 1.

use anyhow::Result;
use clap::Parser;
use vellum::cli;
use vellum::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
