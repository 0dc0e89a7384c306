//! Ordered layer registry.
//!
//! Built once while a document loads. After that only the `visible` flag of
//! each entry changes, through the loader's toggle operations.

use rustc_hash::FxHashMap;

/// A named, independently showable group of drawing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Value of the layer's `inkscape:label` attribute.
    pub label: String,
    /// Index parsed from the layer's `id="layerN"` attribute.
    pub source_index: u32,
    /// Whether the layer is currently displayed.
    pub visible: bool,
}

impl Layer {
    pub fn new(label: impl Into<String>, source_index: u32) -> Self {
        Self {
            label: label.into(),
            source_index,
            visible: true,
        }
    }
}

/// Insertion-ordered mapping label → [`Layer`].
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    by_label: FxHashMap<String, usize>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer in encounter order.
    ///
    /// A label seen before keeps its position but takes the new source index
    /// and visibility (last write wins).
    pub fn register(&mut self, label: &str, source_index: u32, visible: bool) {
        if let Some(&pos) = self.by_label.get(label) {
            let layer = &mut self.layers[pos];
            layer.source_index = source_index;
            layer.visible = visible;
            return;
        }

        self.by_label.insert(label.to_owned(), self.layers.len());
        self.layers.push(Layer {
            label: label.to_owned(),
            source_index,
            visible,
        });
    }

    pub fn get(&self, label: &str) -> Option<&Layer> {
        self.by_label.get(label).map(|&pos| &self.layers[pos])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    /// All layers in registry order.
    pub fn all(&self) -> &[Layer] {
        &self.layers
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// A single layer is not worth splitting, so only two or more count.
    pub fn has_layers(&self) -> bool {
        self.layers.len() > 1
    }

    /// Labels of the layers currently marked visible, in registry order.
    pub fn visible_labels(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .map(|layer| layer.label.as_str())
            .collect()
    }

    pub(crate) fn set_visible(&mut self, label: &str, visible: bool) -> bool {
        match self.by_label.get(label) {
            Some(&pos) => {
                self.layers[pos].visible = visible;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_all_visible(&mut self, visible: bool) {
        for layer in &mut self.layers {
            layer.visible = visible;
        }
    }
}
