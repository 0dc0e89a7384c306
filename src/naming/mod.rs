//! Output naming.
//!
//! [`OutputPattern`] turns token values into a path. [`NamingCoordinator`]
//! decides whether a document yields one output or one per layer and feeds
//! the pattern accordingly, queueing [`NamingWarning`]s for flags that end up
//! having no effect.

mod coordinator;
mod pattern;
mod warning;

pub use coordinator::{LayerMode, LayerNames, NamingCoordinator, NamingOptions, NamingPlan};
pub use pattern::{Glue, OutputPattern, PatternError, PatternValues, Segment, Token};
pub use warning::{IgnoreReason, NamingFlag, NamingWarning};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("layer output requested but the document has {found} layer(s), at least 2 are needed")]
    NoLayersInDocument { found: usize },

    #[error("{}", pattern_message(.label.as_deref(), .source))]
    Pattern {
        label: Option<String>,
        #[source]
        source: PatternError,
    },
}

fn pattern_message(label: Option<&str>, source: &PatternError) -> String {
    match label {
        Some(label) => format!("cannot name output for layer `{label}`: {source}"),
        None => format!("cannot name output: {source}"),
    }
}

/// Input file name with `.svg` or `.svgz` removed.
///
/// `drawings/diagram.svgz` → `diagram`, `notes.v2.svg` → `notes.v2`
pub fn default_basename(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let lower = name.to_ascii_lowercase();
    for ext in [".svgz", ".svg"] {
        if lower.ends_with(ext) && name.len() > ext.len() {
            return name[..name.len() - ext.len()].to_owned();
        }
    }
    name
}
