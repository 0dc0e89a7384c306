//! Decides between one output and one output per layer, and names them.

use std::iter::Enumerate;
use std::path::PathBuf;
use std::slice;

use clap::ValueEnum;
use serde::Deserialize;

use super::pattern::{OutputPattern, PatternValues};
use super::warning::{IgnoreReason, NamingFlag, NamingWarning};
use super::NamingError;
use crate::document::{Layer, LayerRegistry};

/// How layers affect the number of outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LayerMode {
    /// Always a single output.
    None,
    /// One output per layer when the document has at least two.
    #[default]
    #[value(name = "all", alias = "all-if-present")]
    #[serde(rename = "all", alias = "all-if-present")]
    AllIfPresent,
    /// One output per layer; fewer than two layers is an error.
    Forced,
}

/// Naming inputs for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOptions {
    pub dir: Option<PathBuf>,
    pub basename: String,
    pub ext: String,
    pub cont_index: bool,
    pub src_index: bool,
    pub src_label: bool,
}

impl NamingOptions {
    fn selected(&self) -> impl Iterator<Item = NamingFlag> + '_ {
        NamingFlag::ALL.into_iter().filter(|flag| match flag {
            NamingFlag::ContIndex => self.cont_index,
            NamingFlag::SrcIndex => self.src_index,
            NamingFlag::SrcLabel => self.src_label,
        })
    }

    fn base_values(&self) -> PatternValues {
        let mut values = PatternValues::new().basename(&self.basename).ext(&self.ext);
        if let Some(dir) = &self.dir {
            values = values.dir(dir);
        }
        values
    }
}

/// Outcome of [`NamingCoordinator::plan`].
#[derive(Debug)]
pub enum NamingPlan<'a> {
    Single(PathBuf),
    PerLayer(LayerNames<'a>),
}

/// Lazily names each layer in registry order.
///
/// Consumed once; a pattern failure is reported for the layer it concerns
/// and iteration continues with the next one.
#[derive(Debug)]
pub struct LayerNames<'a> {
    pattern: &'a OutputPattern,
    layers: Enumerate<slice::Iter<'a, Layer>>,
    base: PatternValues,
    cont_index: bool,
    src_index: bool,
    src_label: bool,
}

impl<'a> Iterator for LayerNames<'a> {
    type Item = Result<(&'a Layer, PathBuf), NamingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (position, layer) = self.layers.next()?;

        let mut values = self.base.clone();
        if self.cont_index {
            values = values.cont_index(position + 1);
        }
        if self.src_index {
            values = values.src_index(layer.source_index);
        }
        if self.src_label {
            values = values.src_label(&layer.label);
        }

        let named = self
            .pattern
            .resolve(&values)
            .map(|path| (layer, path))
            .map_err(|source| NamingError::Pattern {
                label: Some(layer.label.clone()),
                source,
            });
        Some(named)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.layers.size_hint()
    }
}

impl ExactSizeIterator for LayerNames<'_> {}

/// Applies an [`OutputPattern`] to a loaded document.
#[derive(Debug)]
pub struct NamingCoordinator<'p> {
    pattern: &'p OutputPattern,
    options: NamingOptions,
    warnings: Vec<NamingWarning>,
}

impl<'p> NamingCoordinator<'p> {
    pub fn new(pattern: &'p OutputPattern, options: NamingOptions) -> Self {
        Self {
            pattern,
            options,
            warnings: Vec::new(),
        }
    }

    /// Plan the outputs for `registry` under `mode`.
    ///
    /// Warnings raised while planning are queued for [`Self::take_warnings`].
    pub fn plan<'r>(
        &mut self,
        registry: &'r LayerRegistry,
        mode: LayerMode,
    ) -> Result<NamingPlan<'r>, NamingError>
    where
        'p: 'r,
    {
        let single = match mode {
            LayerMode::None => Some(IgnoreReason::LayersDisabled),
            LayerMode::AllIfPresent if !registry.has_layers() => Some(IgnoreReason::NotEnoughLayers),
            LayerMode::Forced if !registry.has_layers() => {
                return Err(NamingError::NoLayersInDocument {
                    found: registry.len(),
                });
            }
            LayerMode::AllIfPresent | LayerMode::Forced => None,
        };

        if let Some(reason) = single {
            let ignored: Vec<_> = self.options.selected().collect();
            self.warnings.extend(
                ignored
                    .into_iter()
                    .map(|flag| NamingWarning::IgnoredLayerFlag { flag, reason }),
            );
            let path = self
                .pattern
                .resolve(&self.options.base_values())
                .map_err(|source| NamingError::Pattern {
                    label: None,
                    source,
                })?;
            return Ok(NamingPlan::Single(path));
        }

        let mut cont_index = self.options.cont_index;
        if self.options.selected().next().is_none() {
            self.warnings.push(NamingWarning::NoLayerNamingFlag);
            cont_index = true;
        }

        Ok(NamingPlan::PerLayer(LayerNames {
            pattern: self.pattern,
            layers: registry.all().iter().enumerate(),
            base: self.options.base_values(),
            cont_index,
            src_index: self.options.src_index,
            src_label: self.options.src_label,
        }))
    }

    /// Drain queued warnings.
    pub fn take_warnings(&mut self) -> Vec<NamingWarning> {
        std::mem::take(&mut self.warnings)
    }
}
