//! Conversion run: load, plan names, then convert layer by layer.
//!
//! ```text
//! load ──► plan ──► warnings ──► per target: skip? ──► isolate ──► convert
//! ```

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::convert::{converter_for, pick_loader};
use crate::document::DocumentLoader;
use crate::logger::ProgressLine;
use crate::naming::{NamingCoordinator, NamingError, NamingPlan, OutputPattern};
use crate::utils::plural_count;
use crate::{debug, log};

/// One output to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// The document as authored.
    Whole(PathBuf),
    /// The document with only `label` visible.
    Layer { label: String, path: PathBuf },
}

impl Target {
    fn path(&self) -> &PathBuf {
        match self {
            Self::Whole(path) | Self::Layer { path, .. } => path,
        }
    }

    fn label(&self) -> Option<&str> {
        match self {
            Self::Whole(_) => None,
            Self::Layer { label, .. } => Some(label),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Names printed by `--dry-run`.
    pub planned: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Convert `config.input` as configured.
///
/// Fails for problems that stop the whole run (unreadable input, no layers in
/// forced mode). Failures of single outputs are logged and counted instead.
pub fn run(config: &Config) -> Result<Summary> {
    let converter = converter_for(config.output.format, &config.convert.inkscape);
    let kind = pick_loader(config.layers.loader, converter.as_ref());

    let mut doc = kind.create();
    doc.load(&config.input)
        .with_context(|| format!("Failed to load {}", config.input.display()))?;
    log!(
        "load";
        "{} ({}, {} loader)",
        config.input.display(),
        plural_count(doc.registry().len(), "layer"),
        kind.name()
    );

    let pattern = OutputPattern::standard();
    let mut naming = NamingCoordinator::new(&pattern, config.naming_options());
    let targets = plan_targets(&mut naming, doc.as_ref(), config)?;
    for warning in naming.take_warnings() {
        log!("warning"; "{warning}");
    }

    let mut summary = Summary::default();
    if config.dry_run {
        for target in targets {
            match target {
                Ok(target) => {
                    summary.planned += 1;
                    match target.label() {
                        Some(label) => log!("plan"; "{} ({label})", target.path().display()),
                        None => log!("plan"; "{}", target.path().display()),
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    log!("error"; "{err}");
                }
            }
        }
        return Ok(summary);
    }

    if let Some(dir) = &config.output.dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut progress = (targets.len() > 1).then(|| ProgressLine::new("convert", targets.len()));
    let mut seen = FxHashSet::default();

    for target in targets {
        let target = match target {
            Ok(target) => target,
            Err(err) => {
                summary.failed += 1;
                log!("error"; "{err}");
                continue;
            }
        };
        let path = target.path();

        if !seen.insert(path.clone()) {
            summary.failed += 1;
            log!("error"; "{} would be written twice, add --src-index to tell layers apart", path.display());
            continue;
        }
        if path.exists() && !config.output.force {
            summary.skipped += 1;
            log!("skip"; "{} exists, use --force to overwrite", path.display());
            continue;
        }

        if let Some(label) = target.label() {
            doc.isolate(label);
        }
        if let Some(progress) = progress.as_mut() {
            progress.step(target.label().unwrap_or_default());
        }

        match converter.convert(doc.as_ref(), path) {
            Ok(()) => {
                summary.written += 1;
                debug!(converter.name(); "wrote {}", path.display());
            }
            Err(err) => {
                summary.failed += 1;
                match target.label() {
                    Some(label) => log!("error"; "layer `{label}`: {err:#}"),
                    None => log!("error"; "{err:#}"),
                }
            }
        }
    }
    drop(progress);

    log!(
        "done";
        "{} written, {} skipped, {} failed",
        plural_count(summary.written, "file"),
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

/// Resolve every output name up front.
///
/// Names borrow the registry, which toggling needs mutably, so they are
/// turned into owned targets before any conversion starts.
fn plan_targets(
    naming: &mut NamingCoordinator<'_>,
    doc: &dyn DocumentLoader,
    config: &Config,
) -> Result<Vec<Result<Target, NamingError>>, NamingError> {
    let targets = match naming.plan(doc.registry(), config.layers.mode)? {
        NamingPlan::Single(path) => vec![Ok(Target::Whole(path))],
        NamingPlan::PerLayer(names) => names
            .map(|named| {
                named.map(|(layer, path)| Target::Layer {
                    label: layer.label.clone(),
                    path,
                })
            })
            .collect(),
    };
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::OutputFormat;
    use crate::document::LoaderKind;
    use crate::naming::LayerMode;
    use std::path::Path;

    const DRAWING: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" width="30" height="10">
  <g inkscape:groupmode="layer" id="layer2" inkscape:label="bg">
    <rect width="10" height="10" fill="#ff0000"/>
  </g>
  <g inkscape:groupmode="layer" id="layer5" inkscape:label="mid" style="display:none">
    <rect x="10" width="10" height="10" fill="#00ff00"/>
  </g>
  <g inkscape:groupmode="layer" id="layer9" inkscape:label="fg">
    <rect x="20" width="10" height="10" fill="#0000ff"/>
  </g>
</svg>
"##;

    struct Fixture {
        _dir: tempfile::TempDir,
        out: PathBuf,
        config: Config,
    }

    fn fixture(text: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("diagram.svg");
        fs::write(&input, text).unwrap();
        let out = dir.path().join("out");

        let mut config = Config::default();
        config.input = input;
        config.output.dir = Some(out.clone());
        config.output.basename = Some("diagram".to_string());
        Fixture {
            _dir: dir,
            out,
            config,
        }
    }

    fn visible_in(path: &Path) -> Vec<String> {
        let mut doc = LoaderKind::Structured.create();
        doc.load(path).unwrap();
        doc.registry()
            .visible_labels()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_one_file_per_layer() {
        let f = fixture(DRAWING);
        let summary = run(&f.config).unwrap();

        assert_eq!(summary.written, 3);
        assert!(summary.is_success());
        assert_eq!(visible_in(&f.out.join("diagram-01.svg")), vec!["bg"]);
        assert_eq!(visible_in(&f.out.join("diagram-02.svg")), vec!["mid"]);
        assert_eq!(visible_in(&f.out.join("diagram-03.svg")), vec!["fg"]);
    }

    #[test]
    fn test_line_loader_with_labels() {
        let mut f = fixture(DRAWING);
        f.config.layers.loader = LoaderKind::Line;
        f.config.naming.src_index = true;
        f.config.naming.src_label = true;

        run(&f.config).unwrap();
        assert_eq!(visible_in(&f.out.join("diagram-05-mid.svg")), vec!["mid"]);
        assert!(f.out.join("diagram-02-bg.svg").exists());
        assert!(f.out.join("diagram-09-fg.svg").exists());
    }

    #[test]
    fn test_mode_none_keeps_document_as_authored() {
        let mut f = fixture(DRAWING);
        f.config.layers.mode = LayerMode::None;

        let summary = run(&f.config).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(visible_in(&f.out.join("diagram.svg")), vec!["bg", "fg"]);
    }

    #[test]
    fn test_existing_outputs_are_skipped_unless_forced() {
        let mut f = fixture(DRAWING);
        fs::create_dir_all(&f.out).unwrap();
        fs::write(f.out.join("diagram-02.svg"), "keep me").unwrap();

        let summary = run(&f.config).unwrap();
        assert_eq!((summary.written, summary.skipped), (2, 1));
        assert_eq!(fs::read_to_string(f.out.join("diagram-02.svg")).unwrap(), "keep me");

        f.config.output.force = true;
        let summary = run(&f.config).unwrap();
        assert_eq!(summary.written, 3);
        assert_eq!(visible_in(&f.out.join("diagram-02.svg")), vec!["mid"]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut f = fixture(DRAWING);
        f.config.dry_run = true;

        let summary = run(&f.config).unwrap();
        assert_eq!(summary.planned, 3);
        assert_eq!(summary.written, 0);
        assert!(!f.out.exists());
    }

    #[test]
    fn test_forced_mode_needs_layers() {
        let mut f = fixture(r#"<svg width="1" height="1"><g inkscape:groupmode="layer" id="layer1" inkscape:label="only"/></svg>"#);
        f.config.layers.mode = LayerMode::Forced;

        let err = run(&f.config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NamingError>(),
            Some(NamingError::NoLayersInDocument { found: 1 })
        ));
    }

    #[test]
    fn test_colliding_names_are_reported() {
        let text = r#"<svg width="1" height="1">
  <g inkscape:groupmode="layer" id="layer1" inkscape:label="a/b"/>
  <g inkscape:groupmode="layer" id="layer2" inkscape:label="a_b"/>
</svg>"#;
        let mut f = fixture(text);
        f.config.naming.src_label = true;

        let summary = run(&f.config).unwrap();
        assert_eq!((summary.written, summary.failed), (1, 1));
        assert!(!summary.is_success());
    }

    #[test]
    fn test_plain_svg_per_layer() {
        let mut f = fixture(DRAWING);
        f.config.output.format = OutputFormat::PlainSvg;
        f.config.naming.src_label = true;

        run(&f.config).unwrap();
        let fg = fs::read_to_string(f.out.join("diagram-fg.svg")).unwrap();
        assert!(fg.contains("#0000ff"));
        assert!(!fg.contains("#ff0000"));
    }

    #[test]
    fn test_missing_input() {
        let mut f = fixture(DRAWING);
        f.config.input = f.out.join("nope.svg");
        let err = run(&f.config).unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }
}
