//! Text-line document loader.
//!
//! Keeps the document as its original lines, each with its own terminator,
//! and patches the `style` value of layer headers in place, so unrelated
//! bytes are never rewritten. This is the representation handed to external
//! tools: what they read is exactly the source plus the visibility edits.

pub mod scan;

use super::style::{self, Display};
use super::{DocumentLoader, LayerRegistry, LoadError, LoaderKind, Representation, require_size};
use scan::{LayerMatch, Pos, ScanOutcome};

/// Loader that treats the document as an ordered list of text lines.
#[derive(Debug, Default)]
pub struct LineLoader {
    lines: Vec<String>,
    /// Terminator of each line, parallel to `lines`.
    endings: Vec<LineEnd>,
    loaded: bool,
    registry: LayerRegistry,
}

/// How a source line was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Lf,
    CrLf,
    /// Last line without a terminator.
    Eof,
}

impl LineEnd {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Eof => "",
        }
    }
}

/// Split `text` into lines without terminators, plus each line's terminator.
fn split_lines(text: &str) -> (Vec<String>, Vec<LineEnd>) {
    text.split_inclusive('\n')
        .map(|line| {
            if let Some(body) = line.strip_suffix("\r\n") {
                (body.to_owned(), LineEnd::CrLf)
            } else if let Some(body) = line.strip_suffix('\n') {
                (body.to_owned(), LineEnd::Lf)
            } else {
                (line.to_owned(), LineEnd::Eof)
            }
        })
        .unzip()
}

impl LineLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Second pass: rescan and patch every selected layer header.
    ///
    /// Patches run from the last header to the first so the positions of the
    /// headers not yet patched stay valid.
    fn set_display(&mut self, display: Display, select: impl Fn(&str) -> bool) {
        if !self.loaded {
            return;
        }
        let ScanOutcome { layers, .. } = scan::scan(&self.lines);
        for layer in layers.iter().rev().filter(|m| select(&m.label)) {
            patch_header(&mut self.lines, &mut self.endings, layer, display);
        }
    }
}

/// Rewrite (or insert) the `display` declaration of one layer header.
fn patch_header(
    lines: &mut Vec<String>,
    endings: &mut Vec<LineEnd>,
    layer: &LayerMatch,
    display: Display,
) {
    match &layer.style {
        Some(span) => {
            let patched = style::with_display(&span.raw, display);
            if patched != span.raw {
                replace_span(lines, endings, span.start, span.end, &patched);
            }
        }
        None => {
            let attr = format!(r#" {}="display:{}""#, style::STYLE_ATTR, display.as_str());
            let Pos { line, col } = layer.name_end;
            lines[line].insert_str(col, &attr);
        }
    }
}

/// Replace the text between two positions, which may sit on different lines.
///
/// Line breaks inside `text` become separate lines. They reuse the
/// terminators of the replaced lines in order; the last line keeps the
/// terminator of `end.line`.
fn replace_span(
    lines: &mut Vec<String>,
    endings: &mut Vec<LineEnd>,
    start: Pos,
    end: Pos,
    text: &str,
) {
    let tail = &lines[end.line][end.col..];
    let mut pieces = text.split('\n');
    let mut head = lines[start.line][..start.col].to_owned();
    head.push_str(pieces.next().unwrap_or_default());

    let mut replacement = vec![head];
    replacement.extend(pieces.map(str::to_owned));
    if let Some(last) = replacement.last_mut() {
        last.push_str(tail);
    }

    let replaced = &endings[start.line..=end.line];
    let last = replaced[replaced.len() - 1];
    let inner = &replaced[..replaced.len() - 1];
    let fill = inner.first().copied().unwrap_or(last);
    let breaks = replacement.len() - 1;
    let mut new_endings: Vec<LineEnd> = inner.iter().copied().take(breaks).collect();
    new_endings.resize(breaks, fill);
    new_endings.push(last);

    endings.splice(start.line..=end.line, new_endings);
    lines.splice(start.line..=end.line, replacement);
}

impl DocumentLoader for LineLoader {
    fn load_text(&mut self, text: &str) -> Result<(), LoadError> {
        if self.loaded {
            return Ok(());
        }

        let (lines, endings) = split_lines(text);
        let outcome = scan::scan(&lines);

        let root = outcome
            .root
            .as_ref()
            .filter(|root| root.local_name() == style::ROOT_TAG)
            .ok_or_else(|| LoadError::MalformedContainer("no root <svg> element".to_string()))?;
        require_size(root.attrs.iter().map(String::as_str))?;

        let mut registry = LayerRegistry::new();
        for layer in &outcome.layers {
            registry.register(&layer.label, layer.source_index, layer.visible);
        }

        self.lines = lines;
        self.endings = endings;
        self.registry = registry;
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn kind(&self) -> LoaderKind {
        LoaderKind::Line
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
        self.loaded.then_some(Representation::Lines(&self.lines))
    }

    fn to_svg_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 2).sum());
        for (line, ending) in self.lines.iter().zip(&self.endings) {
            out.push_str(line);
            out.push_str(ending.as_str());
        }
        Ok(out.into_bytes())
    }
}
