//! Export through the Inkscape command line.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use super::{Converter, OutputFormat};
use crate::debug;
use crate::document::{DocumentLoader, LoaderKind};
use crate::utils::exec::{Cmd, INKSCAPE_FILTER};

/// Runs `inkscape --export-type=<ext> --export-filename=<out> <tmp.svg>`.
#[derive(Debug, Clone)]
pub struct Inkscape {
    /// Program plus leading arguments, e.g. `["flatpak", "run", "org.inkscape.Inkscape"]`.
    command: Vec<String>,
    format: OutputFormat,
}

impl Inkscape {
    pub fn new(command: Vec<String>, format: OutputFormat) -> Self {
        Self { command, format }
    }

    fn build(&self, source: &Path, output: &Path) -> Cmd {
        Cmd::from_slice(&self.command)
            .arg(format!("--export-type={}", self.format.extension()))
            .arg(format!("--export-filename={}", output.display()))
            .arg(source)
            .filter(&INKSCAPE_FILTER)
    }
}

impl Converter for Inkscape {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn preferred_loader(&self) -> LoaderKind {
        LoaderKind::Line
    }

    fn convert(&self, doc: &dyn DocumentLoader, output: &Path) -> Result<()> {
        if self.command.is_empty() {
            bail!("no inkscape command configured");
        }

        let bytes = doc.to_svg_bytes().context("Failed to serialize document")?;
        let mut source = tempfile::Builder::new()
            .prefix("layersvg-")
            .suffix(".svg")
            .tempfile()
            .context("Failed to create temporary SVG")?;
        source.write_all(&bytes)?;
        source.flush()?;

        // Drop stale output so the check below only sees this run
        match fs::remove_file(output) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                return Err(err)
                    .with_context(|| format!("Failed to replace {}", output.display()));
            }
            _ => {}
        }

        let cmd = self.build(source.path(), output);
        debug!("inkscape"; "{}", cmd.display());
        cmd.run()?;

        if !output.exists() {
            bail!(
                "`{}` exited successfully but did not write {}",
                self.command[0],
                output.display()
            );
        }
        Ok(())
    }
}
