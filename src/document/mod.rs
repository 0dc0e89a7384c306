//! Layered SVG documents.
//!
//! A document is loaded through one of two interchangeable loaders:
//!
//! - [`StructuredLoader`]: parses into an owned node tree and edits
//!   attributes on the nodes.
//! - [`LineLoader`]: keeps the raw text lines and patches the `style`
//!   attribute of layer headers in place, without building a tree.
//!
//! Both expose the same [`DocumentLoader`] contract and must discover the
//! same `(label, source_index)` pairs for the same input. The shared
//! conformance suite lives in `tests.rs`.
//!
//! # Architecture
//!
//! ```text
//! path ──► source::read_svg (gzip probe, then plain text)
//!                 │
//!                 ▼
//!        ┌─────────────────┐      ┌──────────────┐
//!        │ StructuredLoader│  or  │  LineLoader  │
//!        └────────┬────────┘      └──────┬───────┘
//!                 └──────► LayerRegistry ◄┘
//! ```

pub mod line;
pub mod registry;
pub mod source;
pub mod structured;
pub mod style;


pub use line::LineLoader;
pub use registry::{Layer, LayerRegistry};
pub use structured::{Element, StructuredLoader};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors turning an input into a usable document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file `{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("input file `{}` is not readable", .0.display())]
    NotReadable(PathBuf, #[source] std::io::Error),

    #[error("input is neither a gzip container nor an SVG document: {0}")]
    MalformedContainer(String),

    #[error("root <svg> element has no `{attribute}` attribute")]
    SizeAttributeMissing { attribute: &'static str },
}

/// Which loader implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Let the conversion backend decide.
    #[default]
    Auto,
    /// Node tree, attributes edited on nodes.
    Structured,
    /// Raw text lines, patched in place.
    Line,
}

impl LoaderKind {
    /// Create an unloaded loader. `Auto` must be resolved by the caller first
    /// and falls back to the structured loader.
    pub fn create(self) -> Box<dyn DocumentLoader> {
        match self {
            Self::Line => Box::new(LineLoader::new()),
            Self::Structured | Self::Auto => Box::new(StructuredLoader::new()),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Structured => "structured",
            Self::Line => "line",
        }
    }
}

/// The mutable in-memory form handed to a conversion backend.
#[derive(Debug, Clone, Copy)]
pub enum Representation<'a> {
    /// Root `<svg>` element of a parsed tree.
    Nodes(&'a Element),
    /// Ordered text lines, without line terminators.
    Lines(&'a [String]),
}

/// Loads a source document and exposes layer visibility operations.
///
/// Loading is one-shot: once loaded, further `load` calls succeed without
/// touching the source again. Toggles only change the in-memory
/// representation.
pub trait DocumentLoader {
    /// Load SVG text. No-op when already loaded.
    fn load_text(&mut self, text: &str) -> Result<(), LoadError>;

    fn is_loaded(&self) -> bool;

    fn kind(&self) -> LoaderKind;

    /// Layers discovered during load. Empty before load.
    fn registry(&self) -> &LayerRegistry;

    /// Set every layer to `display:inline`.
    fn switch_on_all(&mut self);

    /// Set every layer to `display:none`.
    fn switch_off_all(&mut self);

    /// Make the named layer visible. Blank or unknown labels are ignored.
    fn switch_on(&mut self, label: &str);

    /// Current in-memory form, `None` before load.
    fn representation(&self) -> Option<Representation<'_>>;

    /// Serialize the current representation back to SVG.
    fn to_svg_bytes(&self) -> std::io::Result<Vec<u8>>;

    /// Load a file (`.svg` or `.svgz`). No-op when already loaded.
    fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }
        let text = source::read_svg(path)?;
        self.load_text(&text)
    }

    /// Load raw bytes, probing for gzip first. No-op when already loaded.
    fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }
        let text = source::decode_svg(bytes)?;
        self.load_text(&text)
    }

    /// Switch off every layer, then switch on exactly `label`.
    fn isolate(&mut self, label: &str) {
        self.switch_off_all();
        self.switch_on(label);
    }
}

/// Check the root element declares its size.
fn require_size<'a>(attrs: impl IntoIterator<Item = &'a str>) -> Result<(), LoadError> {
    let names: Vec<&str> = attrs.into_iter().collect();
    for attribute in ["width", "height"] {
        if !names.contains(&attribute) {
            return Err(LoadError::SizeAttributeMissing { attribute });
        }
    }
    Ok(())
}
