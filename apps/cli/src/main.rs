//! docmirror CLI: mirror a documentation site into one Markdown file.
//!
//! Reads a sitemap, keeps the URLs under a prefix, converts each page to
//! Markdown, and writes the concatenated result.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
