//! layersvg - convert layered SVG drawings, one output per layer.

#![allow(dead_code)]

mod cli;
mod config;
mod convert;
mod document;
mod logger;
mod naming;
mod utils;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Config::load(&cli)?;
    if let Some(path) = &config.config_path {
        debug!("config"; "using {}", path.display());
    }

    let summary = cli::run(&config)?;
    if !summary.is_success() {
        bail!("{} could not be written", utils::plural_count(summary.failed, "output"));
    }
    Ok(())
}
