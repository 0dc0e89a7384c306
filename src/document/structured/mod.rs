//! Tree-backed document loader.
//!
//! Layers are the immediate `<g inkscape:groupmode="layer">` children of the
//! root `<svg>`. Toggling rewrites the `style` attribute on those nodes.

mod tree;

pub use tree::{Element, Node, Tree};

use super::style::{self, Display};
use super::{DocumentLoader, LayerRegistry, LoadError, LoaderKind, Representation, require_size};

/// Loader that parses the document into an owned node tree.
#[derive(Debug, Default)]
pub struct StructuredLoader {
    tree: Option<Tree>,
    registry: LayerRegistry,
}

impl StructuredLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `display` to every layer node whose label passes `select`.
    fn set_display(&mut self, display: Display, select: impl Fn(&str) -> bool) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };

        for el in tree.root.child_elements_mut() {
            let Some((label, _)) = layer_identity(el) else {
                continue;
            };
            if !select(&label) {
                continue;
            }
            let current = el.attr(style::STYLE_ATTR).unwrap_or_default();
            let patched = style::with_display(current, display);
            el.set_attr(style::STYLE_ATTR, patched);
        }
    }
}

/// `(label, source_index)` of a layer node, `None` for anything else.
fn layer_identity(el: &Element) -> Option<(String, u32)> {
    if el.local_name() != style::GROUP_TAG
        || el.attr(style::GROUPMODE_ATTR) != Some(style::GROUPMODE_LAYER)
    {
        return None;
    }
    let index = style::parse_source_index(el.attr(style::ID_ATTR)?)?;
    let label = style::decode_label(el.attr(style::LABEL_ATTR)?);
    Some((label, index))
}

impl DocumentLoader for StructuredLoader {
    fn load_text(&mut self, text: &str) -> Result<(), LoadError> {
        if self.tree.is_some() {
            return Ok(());
        }

        let tree = Tree::parse(text)?;
        require_size(tree.root.attr_names())?;

        let mut registry = LayerRegistry::new();
        for el in tree.root.child_elements() {
            if let Some((label, index)) = layer_identity(el) {
                let hidden = el.attr(style::STYLE_ATTR).is_some_and(style::is_hidden);
                registry.register(&label, index, !hidden);
            }
        }

        self.registry = registry;
        self.tree = Some(tree);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    fn kind(&self) -> LoaderKind {
        LoaderKind::Structured
    }

    fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    fn switch_on_all(&mut self) {
        self.set_display(Display::Inline, |_| true);
        self.registry.set_all_visible(true);
    }

    fn switch_off_all(&mut self) {
        self.set_display(Display::None, |_| true);
        self.registry.set_all_visible(false);
    }

    fn switch_on(&mut self, label: &str) {
        if label.trim().is_empty() || !self.registry.contains(label) {
            return;
        }
        self.set_display(Display::Inline, |candidate| candidate == label);
        self.registry.set_visible(label, true);
    }

    fn representation(&self) -> Option<Representation<'_>> {
        self.tree.as_ref().map(|tree| Representation::Nodes(&tree.root))
    }

    fn to_svg_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.tree {
            Some(tree) => tree.to_bytes(),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"<svg width="1" height="1" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
  <g inkscape:groupmode="layer" id="layer1" inkscape:label="outer">
    <g inkscape:groupmode="layer" id="layer2" inkscape:label="sub"/>
  </g>
  <defs><g inkscape:groupmode="layer" id="layer3" inkscape:label="hidden-in-defs"/></defs>
  <g inkscape:groupmode="layer" id="layer4" inkscape:label="Tom &amp; Jerry" style="display:none"/>
</svg>"#;

    #[test]
    fn test_only_root_children_are_layers() {
        let mut loader = StructuredLoader::new();
        loader.load_text(NESTED).unwrap();

        let labels: Vec<_> = loader.registry().labels().collect();
        assert_eq!(labels, vec!["outer", "Tom & Jerry"]);
        assert_eq!(loader.registry().get("Tom & Jerry").map(|l| l.visible), Some(false));
    }

    #[test]
    fn test_switch_rewrites_style_attribute() {
        let mut loader = StructuredLoader::new();
        loader.load_text(NESTED).unwrap();
        loader.switch_on("Tom & Jerry");

        let Some(Representation::Nodes(root)) = loader.representation() else {
            panic!("expected node representation");
        };
        let styles: Vec<_> = root
            .child_elements()
            .filter(|el| el.name == "g")
            .map(|el| el.attr("style"))
            .collect();
        assert_eq!(styles, vec![None, Some("display:inline")]);
    }

    #[test]
    fn test_unloaded_loader_is_inert() {
        let mut loader = StructuredLoader::new();
        loader.switch_off_all();
        loader.switch_on("x");
        assert!(loader.representation().is_none());
        assert!(loader.to_svg_bytes().unwrap().is_empty());
        assert!(loader.registry().is_empty());
    }
}
