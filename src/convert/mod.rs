//! Output backends.
//!
//! A [`Converter`] receives a loaded document with its visibility already
//! set and writes one output file.
//!
//! ```text
//!   OutputFormat ──► converter_for() ──► SvgWriter       (svg)
//!                                   ├──► PlainSvgWriter  (plain-svg, usvg)
//!                                   └──► Inkscape        (pdf png eps ps emf)
//! ```

mod inkscape;
mod svg;

pub use inkscape::Inkscape;
pub use svg::{PlainSvgWriter, SvgWriter};

use anyhow::Result;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::document::{DocumentLoader, LoaderKind};

/// Target file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// The source SVG with visibility edits only
    #[default]
    Svg,
    /// SVG normalized by usvg, hidden content removed
    PlainSvg,
    Pdf,
    Png,
    Eps,
    Ps,
    Emf,
}

impl OutputFormat {
    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg | Self::PlainSvg => "svg",
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Eps => "eps",
            Self::Ps => "ps",
            Self::Emf => "emf",
        }
    }

    pub const fn needs_inkscape(self) -> bool {
        !matches!(self, Self::Svg | Self::PlainSvg)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::PlainSvg => "plain-svg",
            other => other.extension(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes one output from a prepared document.
pub trait Converter {
    fn name(&self) -> &'static str;

    /// Loader used when the user asks for `auto`.
    fn preferred_loader(&self) -> LoaderKind;

    /// Write the document's current state to `output`.
    fn convert(&self, doc: &dyn DocumentLoader, output: &Path) -> Result<()>;
}

/// Backend for `format`. `inkscape` is the command line that launches Inkscape.
pub fn converter_for(format: OutputFormat, inkscape: &[String]) -> Box<dyn Converter> {
    match format {
        OutputFormat::Svg => Box::new(SvgWriter),
        OutputFormat::PlainSvg => Box::new(PlainSvgWriter::default()),
        _ => Box::new(Inkscape::new(inkscape.to_vec(), format)),
    }
}

/// Resolve `auto` against the backend's preference.
pub fn pick_loader(requested: LoaderKind, converter: &dyn Converter) -> LoaderKind {
    match requested {
        LoaderKind::Auto => converter.preferred_loader(),
        explicit => explicit,
    }
}
