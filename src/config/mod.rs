//! Configuration for `layersvg.toml`.
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[output]`  | Output directory, base name, format, overwrite   |
//! | `[naming]`  | Layer naming flags                               |
//! | `[layers]`  | Layer mode and document loader                   |
//! | `[convert]` | External converter command                       |
//!
//! Values from the file are overridden by command-line flags.

mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::convert::OutputFormat;
use crate::document::LoaderKind;
use crate::naming::{LayerMode, NamingOptions, default_basename};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "layersvg.toml";

/// Root configuration structure representing layersvg.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input drawing (internal use only)
    #[serde(skip)]
    pub input: PathBuf,

    /// Config file the values came from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(skip)]
    pub dry_run: bool,

    pub output: OutputConfig,
    pub naming: NamingConfig,
    pub layers: LayersConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory; outputs go to the working directory when unset.
    pub dir: Option<PathBuf>,
    /// Defaults to the input file name without `.svg`/`.svgz`.
    pub basename: Option<String>,
    pub format: OutputFormat,
    pub force: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub cont_index: bool,
    pub src_index: bool,
    pub src_label: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayersConfig {
    pub mode: LayerMode,
    pub loader: LoaderKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Program plus leading arguments.
    pub inkscape: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            inkscape: vec!["inkscape".to_string()],
        }
    }
}

impl Config {
    /// Load configuration for one run.
    ///
    /// An explicit `--config` must exist; the default file is optional and
    /// searched upward from the working directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_default();
        let path = resolve_config_path(cli.config.as_deref(), &cwd)?;

        let mut config = match &path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.config_path = path;
        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))
    }

    /// Apply command-line overrides and fill derived defaults.
    fn finalize(&mut self, cli: &Cli) {
        self.input = cli.input.clone();
        self.dry_run = cli.dry_run;

        if let Some(dir) = &cli.output {
            self.output.dir = Some(dir.clone());
        }
        if let Some(basename) = &cli.basename {
            self.output.basename = Some(basename.clone());
        }
        Self::update_option(&mut self.output.format, cli.format.as_ref());
        Self::update_option(&mut self.output.force, cli.force.as_ref());

        Self::update_option(&mut self.naming.cont_index, cli.cont_index.as_ref());
        Self::update_option(&mut self.naming.src_index, cli.src_index.as_ref());
        Self::update_option(&mut self.naming.src_label, cli.src_label.as_ref());

        Self::update_option(&mut self.layers.mode, cli.layers.as_ref());
        Self::update_option(&mut self.layers.loader, cli.loader.as_ref());

        // Whitespace split: paths with spaces need the list form in the file
        if let Some(command) = &cli.inkscape {
            self.convert.inkscape = command.split_whitespace().map(str::to_owned).collect();
        }

        if self.output.basename.is_none() {
            self.output.basename = Some(default_basename(&self.input));
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(basename) = &self.output.basename
            && basename.contains(['/', '\\'])
        {
            return Err(ConfigError::validation(
                "output.basename",
                format!("`{basename}` must not contain a path separator, use output.dir"),
            ));
        }

        if self.output.format.needs_inkscape() {
            let Some(program) = self.convert.inkscape.first() else {
                return Err(ConfigError::validation(
                    "convert.inkscape",
                    format!("`{}` output needs an inkscape command", self.output.format),
                ));
            };
            // A dry run never starts the converter
            if !self.dry_run && which::which(program).is_err() {
                return Err(ConfigError::validation(
                    "convert.inkscape",
                    format!(
                        "`{program}` not found, install Inkscape or choose svg/plain-svg output"
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn naming_options(&self) -> NamingOptions {
        NamingOptions {
            dir: self.output.dir.clone(),
            basename: self.output.basename.clone().unwrap_or_default(),
            ext: self.output.format.extension().to_string(),
            cont_index: self.naming.cont_index,
            src_index: self.naming.src_index,
            src_label: self.naming.src_label,
        }
    }
}

/// Config file to read, `None` when running on defaults.
fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(ConfigError::NotFound(path.to_path_buf()))
        };
    }
    Ok(find_config_file(Path::new(DEFAULT_CONFIG), cwd))
}

/// Walk up from `start` looking for `name`.
fn find_config_file(name: &Path, start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["layersvg"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::from_str(
            r#"
            [output]
            dir = "out"
            basename = "diagram"
            format = "pdf"
            force = true

            [naming]
            src_index = true

            [layers]
            mode = "forced"
            loader = "line"

            [convert]
            inkscape = ["flatpak", "run", "org.inkscape.Inkscape"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output.dir, Some(PathBuf::from("out")));
        assert_eq!(config.output.format, OutputFormat::Pdf);
        assert!(config.output.force);
        assert!(config.naming.src_index && !config.naming.cont_index);
        assert_eq!(config.layers.mode, LayerMode::Forced);
        assert_eq!(config.layers.loader, LoaderKind::Line);
        assert_eq!(config.convert.inkscape.len(), 3);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.output.format, OutputFormat::Svg);
        assert_eq!(config.layers.mode, LayerMode::AllIfPresent);
        assert_eq!(config.layers.loader, LoaderKind::Auto);
        assert_eq!(config.convert.inkscape, vec!["inkscape"]);

        let config = Config::from_str("[layers]\nmode = \"all-if-present\"").unwrap();
        assert_eq!(config.layers.mode, LayerMode::AllIfPresent);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(Config::from_str("[output]\nfromat = \"pdf\"").is_err());
        assert!(Config::from_str("[output]\nformat = \"gif\"").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::from_str(
            "[output]\nformat = \"plain-svg\"\nforce = true\n[naming]\ncont_index = true",
        )
        .unwrap();
        config.finalize(&cli(&[
            "drawings/map.svgz",
            "-o",
            "build",
            "--force=false",
            "--cont-index=false",
            "--src-label",
            "--inkscape",
            "flatpak run org.inkscape.Inkscape",
        ]));

        assert_eq!(config.output.dir, Some(PathBuf::from("build")));
        assert_eq!(config.output.format, OutputFormat::PlainSvg);
        assert!(!config.output.force);
        assert!(!config.naming.cont_index);
        assert!(config.naming.src_label);
        assert_eq!(config.output.basename.as_deref(), Some("map"));
        assert_eq!(config.convert.inkscape, vec!["flatpak", "run", "org.inkscape.Inkscape"]);

        let naming = config.naming_options();
        assert_eq!(naming.ext, "svg");
        assert_eq!(naming.basename, "map");
    }

    #[test]
    fn test_inkscape_path_with_spaces() {
        let mut config = Config::from_str(
            r#"
            [convert]
            inkscape = ["/Applications/Inkscape App/inkscape", "--no-gui"]
            "#,
        )
        .unwrap();
        config.finalize(&cli(&["a.svg"]));
        assert_eq!(
            config.convert.inkscape,
            vec!["/Applications/Inkscape App/inkscape", "--no-gui"]
        );

        // The command line form splits on every space
        config.finalize(&cli(&["a.svg", "--inkscape", "/opt/my inkscape"]));
        assert_eq!(config.convert.inkscape, vec!["/opt/my", "inkscape"]);
    }

    #[test]
    fn test_validate_basename() {
        let mut config = Config::default();
        config.finalize(&cli(&["a.svg", "-b", "sub/name"]));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field: "output.basename", .. }));
    }

    #[test]
    fn test_validate_missing_inkscape() {
        let mut config = Config::default();
        config.finalize(&cli(&["a.svg", "-f", "pdf", "--inkscape", "no-such-inkscape-binary"]));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field: "convert.inkscape", .. }));

        // Only a real conversion needs the program
        config.dry_run = true;
        assert!(config.validate().is_ok());

        config.convert.inkscape.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_svg_output_needs_no_inkscape() {
        let mut config = Config::default();
        config.finalize(&cli(&["a.svg", "--inkscape", "no-such-inkscape-binary"]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let file = dir.path().join(DEFAULT_CONFIG);
        fs::write(&file, "[output]\nformat = \"png\"").unwrap();

        assert_eq!(resolve_config_path(None, &nested).unwrap(), Some(file.clone()));
        assert_eq!(resolve_config_path(Some(&file), &nested).unwrap(), Some(file.clone()));

        let missing = dir.path().join("other.toml");
        assert!(matches!(
            resolve_config_path(Some(&missing), &nested),
            Err(ConfigError::NotFound(_))
        ));

        let loaded = Config::from_path(&file).unwrap();
        assert_eq!(loaded.output.format, OutputFormat::Png);
    }

    #[test]
    fn test_broken_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG);
        fs::write(&file, "[output\n").unwrap();
        let err = Config::from_path(&file).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(ref p, _) if p == &file));
    }
}
