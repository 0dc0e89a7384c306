//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

use crate::convert::OutputFormat;
use crate::document::LoaderKind;
use crate::naming::LayerMode;

/// Split a layered SVG drawing into one converted file per layer
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Input drawing (.svg or .svgz)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output directory (created when missing)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Base file name of the outputs (default: input name without extension)
    #[arg(short, long)]
    pub basename: Option<String>,

    /// Layer handling: none, all (when the drawing has layers), forced
    #[arg(short = 'l', long = "layers")]
    pub layers: Option<LayerMode>,

    /// Number outputs by their position (01, 02, ...)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub cont_index: Option<bool>,

    /// Number outputs by the layer's own index (the digits of `id="layerN"`)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub src_index: Option<bool>,

    /// Append the layer label to output names
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub src_label: Option<bool>,

    /// Document loader
    #[arg(long)]
    pub loader: Option<LoaderKind>,

    /// Command used to run Inkscape, e.g. "flatpak run org.inkscape.Inkscape".
    ///
    /// Split on whitespace; a program path containing spaces goes in the
    /// `convert.inkscape` list of layersvg.toml instead.
    #[arg(long)]
    pub inkscape: Option<String>,

    /// Overwrite existing outputs
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub force: Option<bool>,

    /// Print planned output names without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Config file path (default: layersvg.toml, searched upward from cwd)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
