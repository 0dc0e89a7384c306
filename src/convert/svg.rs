//! SVG outputs written in-process.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::Converter;
use crate::document::{DocumentLoader, LoaderKind};

/// Writes the document bytes unchanged apart from layer visibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgWriter;

impl Converter for SvgWriter {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn preferred_loader(&self) -> LoaderKind {
        LoaderKind::Structured
    }

    fn convert(&self, doc: &dyn DocumentLoader, output: &Path) -> Result<()> {
        let bytes = doc.to_svg_bytes().context("Failed to serialize document")?;
        fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))
    }
}

/// Re-serializes through usvg: hidden layers, editor metadata and
/// unreferenced definitions are dropped.
#[derive(Debug, Clone)]
pub struct PlainSvgWriter {
    pub dpi: f32,
}

impl Default for PlainSvgWriter {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

impl PlainSvgWriter {
    fn simplify(&self, data: &[u8]) -> Result<String> {
        let options = usvg::Options {
            dpi: self.dpi,
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(data, &options).context("Failed to parse SVG")?;
        Ok(tree.to_string(&usvg::WriteOptions::default()))
    }
}

impl Converter for PlainSvgWriter {
    fn name(&self) -> &'static str {
        "usvg"
    }

    fn preferred_loader(&self) -> LoaderKind {
        LoaderKind::Structured
    }

    fn convert(&self, doc: &dyn DocumentLoader, output: &Path) -> Result<()> {
        let bytes = doc.to_svg_bytes().context("Failed to serialize document")?;
        let plain = self.simplify(&bytes)?;
        fs::write(output, plain).with_context(|| format!("Failed to write {}", output.display()))
    }
}
