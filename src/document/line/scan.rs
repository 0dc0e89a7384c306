//! Single-pass layer scanner over text lines.
//!
//! Two machines run in lockstep:
//!
//! - a tag lexer that understands just enough markup to find start tags, end
//!   tags and attribute values (quotes, comments, CDATA, processing
//!   instructions and doctype declarations are skipped correctly), tracking
//!   element depth;
//! - the layer machine, which consumes lexer tokens:
//!
//! ```text
//!             <g> child of root           tag closed, marker+index+label
//!  Outside ─────────────────────► InLayerHeader ──────────────────► Committed
//!     ▲                                │ tag closed, incomplete          │
//!     ├────────────────────────────────┘                                 │
//!     └──────────────────────── matching </g> (or self-closing) ─────────┘
//! ```
//!
//! Whitespace inside tags is XML whitespace only (space, tab, CR, LF), the
//! same class the tree parser splits on. Any other character, including
//! U+00A0, is part of a name.
//!
//! Every line is visited once and nothing is re-read, so a scan is
//! O(number of lines).

use crate::document::style;

/// Byte position inside the line sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Location of an attribute value, excluding its quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpan {
    pub start: Pos,
    pub end: Pos,
    /// Raw (still escaped) value text.
    pub raw: String,
}

/// A committed layer header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMatch {
    pub label: String,
    pub source_index: u32,
    pub visible: bool,
    /// Position right after the tag name, where a missing `style` goes.
    pub name_end: Pos,
    pub style: Option<ValueSpan>,
}

/// Root element details needed by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootTag {
    pub name: String,
    pub attrs: Vec<String>,
}

impl RootTag {
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }
}

/// Everything a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub root: Option<RootTag>,
    pub layers: Vec<LayerMatch>,
}

/// Scan the lines once and report the root element and every layer header.
pub fn scan<S: AsRef<str>>(lines: &[S]) -> ScanOutcome {
    let mut scanner = Scanner::default();
    for (line_no, line) in lines.iter().enumerate() {
        scanner.feed_line(line_no, line.as_ref());
    }
    scanner.finish()
}

// ============================================================================
// Layer machine
// ============================================================================

/// State of the layer machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanState {
    /// Not inside any layer.
    #[default]
    Outside,
    /// Inside the start tag of a `<g>` that is a child of the root.
    InLayerHeader(Header),
    /// Inside the body of a committed layer.
    Committed,
}

/// Captures collected while in [`ScanState::InLayerHeader`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    name_end: Pos,
    marker: bool,
    index: Option<u32>,
    label: Option<String>,
    style: Option<ValueSpan>,
}

/// Tokens produced by the lexer.
#[derive(Debug)]
enum Token {
    /// Name of a start tag is complete. `depth` counts the open ancestors.
    Open {
        name: String,
        name_end: Pos,
        depth: usize,
    },
    Attr {
        name: String,
        value: ValueSpan,
    },
    /// Start tag closed.
    Close { self_closing: bool },
    /// End tag; `depth` is the count of open elements after it.
    End { depth: usize },
}

#[derive(Debug, Default)]
struct Scanner {
    lexer: Lexer,
    state: ScanState,
    in_root_tag: bool,
    root: Option<RootTag>,
    layers: Vec<LayerMatch>,
}

impl Scanner {
    fn feed_line(&mut self, line_no: usize, line: &str) {
        let mut tokens = Vec::new();
        self.lexer.feed_line(line_no, line, &mut tokens);
        for token in tokens {
            self.step(token);
        }
    }

    fn step(&mut self, token: Token) {
        self.track_root(&token);

        self.state = match (std::mem::take(&mut self.state), token) {
            (ScanState::Outside, Token::Open { name, name_end, depth })
                if depth == 1 && local_name(&name) == style::GROUP_TAG =>
            {
                ScanState::InLayerHeader(Header {
                    name_end,
                    ..Header::default()
                })
            }
            (ScanState::InLayerHeader(mut header), Token::Attr { name, value }) => {
                capture(&mut header, &name, value);
                ScanState::InLayerHeader(header)
            }
            (ScanState::InLayerHeader(header), Token::Close { self_closing }) => {
                if self.commit(header) && !self_closing {
                    ScanState::Committed
                } else {
                    ScanState::Outside
                }
            }
            (ScanState::Committed, Token::End { depth }) if depth == 1 => ScanState::Outside,
            (state, _) => state,
        };
    }

    /// Turn a complete header into a match. Returns whether it was one.
    fn commit(&mut self, header: Header) -> bool {
        if !header.marker {
            return false;
        }
        let (Some(source_index), Some(label)) = (header.index, header.label) else {
            return false;
        };

        let visible = !header.style.as_ref().is_some_and(|s| style::is_hidden(&s.raw));
        self.layers.push(LayerMatch {
            label,
            source_index,
            visible,
            name_end: header.name_end,
            style: header.style,
        });
        true
    }

    fn track_root(&mut self, token: &Token) {
        match token {
            Token::Open { name, depth: 0, .. } if self.root.is_none() => {
                self.root = Some(RootTag {
                    name: name.clone(),
                    attrs: Vec::new(),
                });
                self.in_root_tag = true;
            }
            Token::Attr { name, .. } if self.in_root_tag => {
                if let Some(root) = self.root.as_mut() {
                    root.attrs.push(name.clone());
                }
            }
            Token::Close { .. } => self.in_root_tag = false,
            _ => {}
        }
    }

    fn finish(self) -> ScanOutcome {
        ScanOutcome {
            root: self.root,
            layers: self.layers,
        }
    }
}

fn capture(header: &mut Header, name: &str, value: ValueSpan) {
    match name {
        style::GROUPMODE_ATTR => header.marker = value.raw == style::GROUPMODE_LAYER,
        style::ID_ATTR => header.index = style::parse_source_index(&value.raw),
        style::LABEL_ATTR => header.label = Some(style::decode_label(&value.raw)),
        style::STYLE_ATTR => header.style = Some(value),
        _ => {}
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

// ============================================================================
// Tag lexer
// ============================================================================

#[derive(Debug, Default)]
enum Lex {
    #[default]
    Text,
    Comment,
    CData,
    Instruction,
    /// `<!DOCTYPE ...>`; counts `[` `]` of an internal subset.
    Declaration(usize),
    Tag(Tag),
}

#[derive(Debug)]
struct Tag {
    closing: bool,
    name: String,
    part: TagPart,
    slash: bool,
}

#[derive(Debug)]
enum TagPart {
    Name,
    Between,
    AfterAttrName(String),
    BeforeValue(String),
    Value {
        name: String,
        quote: u8,
        start: Pos,
        raw: String,
    },
}

#[derive(Debug, Default)]
struct Lexer {
    lex: Lex,
    depth: usize,
}

impl Lexer {
    fn feed_line(&mut self, line_no: usize, line: &str, out: &mut Vec<Token>) {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            i = self.advance(line, line_no, i, out);
        }

        // A line break ends a tag name or a bare attribute name
        if let Lex::Tag(tag) = &mut self.lex {
            match &mut tag.part {
                TagPart::Name => {
                    let name_end = Pos::new(line_no, bytes.len());
                    tag.part = TagPart::Between;
                    emit_open(tag, name_end, self.depth, out);
                }
                TagPart::Value { raw, .. } => raw.push('\n'),
                _ => {}
            }
        }
    }

    /// One lexer step from byte `i`. Returns the next byte offset.
    ///
    /// A step may return `i` unchanged only to switch tag parts; at most two
    /// such steps run back to back before a byte is consumed.
    fn advance(&mut self, line: &str, line_no: usize, i: usize, out: &mut Vec<Token>) -> usize {
        let bytes = line.as_bytes();
        match &mut self.lex {
            Lex::Text => match line[i..].find('<') {
                Some(k) => self.open_markup(line, i + k),
                None => bytes.len(),
            },
            Lex::Comment => self.skip_until(line, i, "-->"),
            Lex::CData => self.skip_until(line, i, "]]>"),
            Lex::Instruction => self.skip_until(line, i, "?>"),
            Lex::Declaration(nesting) => {
                let mut j = i;
                let mut done = false;
                while j < bytes.len() {
                    match bytes[j] {
                        b'[' => *nesting += 1,
                        b']' => *nesting = nesting.saturating_sub(1),
                        b'>' if *nesting == 0 => {
                            done = true;
                            j += 1;
                            break;
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if done {
                    self.lex = Lex::Text;
                }
                j
            }
            Lex::Tag(_) => self.lex_tag(line, line_no, i, out),
        }
    }

    /// Decide what kind of markup starts at `at` (a `<`).
    fn open_markup(&mut self, line: &str, at: usize) -> usize {
        let rest = &line[at..];
        let (lex, skip) = if rest.starts_with("<!--") {
            (Lex::Comment, 4)
        } else if rest.starts_with("<![CDATA[") {
            (Lex::CData, 9)
        } else if rest.starts_with("<!") {
            (Lex::Declaration(0), 2)
        } else if rest.starts_with("<?") {
            (Lex::Instruction, 2)
        } else {
            let closing = rest.starts_with("</");
            let tag = Tag {
                closing,
                name: String::new(),
                part: TagPart::Name,
                slash: false,
            };
            (Lex::Tag(tag), if closing { 2 } else { 1 })
        };
        self.lex = lex;
        at + skip
    }

    fn skip_until(&mut self, line: &str, from: usize, terminator: &str) -> usize {
        match line[from..].find(terminator) {
            Some(k) => {
                self.lex = Lex::Text;
                from + k + terminator.len()
            }
            None => line.len(),
        }
    }

    /// Advance inside a tag. Returns the next byte offset.
    fn lex_tag(&mut self, line: &str, line_no: usize, i: usize, out: &mut Vec<Token>) -> usize {
        let Lex::Tag(tag) = &mut self.lex else {
            return i;
        };
        let bytes = line.as_bytes();
        let c = bytes[i];

        match &mut tag.part {
            TagPart::Name => {
                let end = word_end(line, i);
                tag.name.push_str(&line[i..end]);
                if end < bytes.len() {
                    tag.part = TagPart::Between;
                    emit_open(tag, Pos::new(line_no, end), self.depth, out);
                }
                end
            }
            TagPart::Between => match c {
                b'>' => {
                    let closing = tag.closing;
                    let self_closing = tag.slash;
                    self.lex = Lex::Text;
                    if closing {
                        self.depth = self.depth.saturating_sub(1);
                        out.push(Token::End { depth: self.depth });
                    } else {
                        out.push(Token::Close { self_closing });
                        if !self_closing {
                            self.depth += 1;
                        }
                    }
                    i + 1
                }
                b'/' => {
                    tag.slash = true;
                    i + 1
                }
                c if is_xml_space(c) => i + 1,
                _ => {
                    tag.slash = false;
                    let end = word_end(line, i);
                    tag.part = TagPart::AfterAttrName(line[i..end].to_owned());
                    end
                }
            },
            TagPart::AfterAttrName(name) => match c {
                b'=' => {
                    tag.part = TagPart::BeforeValue(std::mem::take(name));
                    i + 1
                }
                c if is_xml_space(c) => i + 1,
                // Attribute without a value: drop it
                _ => {
                    tag.part = TagPart::Between;
                    i
                }
            },
            TagPart::BeforeValue(name) => match c {
                b'"' | b'\'' => {
                    tag.part = TagPart::Value {
                        name: std::mem::take(name),
                        quote: c,
                        start: Pos::new(line_no, i + 1),
                        raw: String::new(),
                    };
                    i + 1
                }
                c if is_xml_space(c) => i + 1,
                _ => {
                    tag.part = TagPart::Between;
                    i
                }
            },
            TagPart::Value {
                name,
                quote,
                start,
                raw,
            } => {
                let quote = char::from(*quote);
                match line[i..].find(quote) {
                    Some(k) => {
                        raw.push_str(&line[i..i + k]);
                        out.push(Token::Attr {
                            name: std::mem::take(name),
                            value: ValueSpan {
                                start: *start,
                                end: Pos::new(line_no, i + k),
                                raw: std::mem::take(raw),
                            },
                        });
                        tag.part = TagPart::Between;
                        i + k + 1
                    }
                    None => {
                        raw.push_str(&line[i..]);
                        bytes.len()
                    }
                }
            }
        }
    }
}

fn emit_open(tag: &Tag, name_end: Pos, depth: usize, out: &mut Vec<Token>) {
    if tag.closing {
        return;
    }
    out.push(Token::Open {
        name: tag.name.clone(),
        name_end,
        depth,
    });
}

fn is_xml_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// End of a tag or attribute name starting at `from`.
fn word_end(line: &str, from: usize) -> usize {
    line[from..]
        .find(|ch: char| {
            ch.is_ascii() && (is_xml_space(ch as u8) || matches!(ch, '>' | '/' | '='))
        })
        .map_or(line.len(), |k| from + k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(outcome: &ScanOutcome) -> Vec<(&str, u32)> {
        outcome
            .layers
            .iter()
            .map(|m| (m.label.as_str(), m.source_index))
            .collect()
    }

    #[test]
    fn test_multiline_header_any_attribute_order() {
        let lines = [
            r#"<svg width="10" height="10">"#,
            "  <g",
            r#"     inkscape:label="bg""#,
            r#"     inkscape:groupmode="layer""#,
            r#"     id="layer2""#,
            r#"     style="display:none">"#,
            r#"    <rect id="r" />"#,
            "  </g>",
            "</svg>",
        ];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("bg", 2)]);

        let layer = &outcome.layers[0];
        assert!(!layer.visible);
        assert_eq!(layer.name_end, Pos::new(1, 4));

        let style = layer.style.as_ref().unwrap();
        assert_eq!(style.raw, "display:none");
        assert_eq!(style.start, Pos::new(5, 12));
        assert_eq!(style.end, Pos::new(5, 24));
    }

    #[test]
    fn test_single_line_document() {
        let lines = [concat!(
            r#"<svg width="1" height="1">"#,
            r#"<g inkscape:groupmode="layer" id="layer1" inkscape:label="a"/>"#,
            r#"<g id="layer7" inkscape:groupmode="layer" inkscape:label="b"><path d="M0 0"/></g>"#,
            "</svg>",
        )];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("a", 1), ("b", 7)]);
    }

    #[test]
    fn test_nested_groups_are_not_layers() {
        let lines = [
            r#"<svg width="1" height="1">"#,
            r#"<g inkscape:groupmode="layer" id="layer1" inkscape:label="outer">"#,
            r#"  <g inkscape:groupmode="layer" id="layer2" inkscape:label="sub"></g>"#,
            "</g>",
            r#"<defs><g inkscape:groupmode="layer" id="layer3" inkscape:label="d"/></defs>"#,
            "</svg>",
        ];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("outer", 1)]);
    }

    #[test]
    fn test_comments_and_cdata_are_skipped() {
        let lines = [
            r#"<?xml version="1.0"?>"#,
            r#"<!DOCTYPE svg [ <!ENTITY e "x"> ]>"#,
            r#"<svg width="1" height="1">"#,
            r#"<!-- <g inkscape:groupmode="layer" id="layer1" inkscape:label="ghost"> -->"#,
            r#"<style><![CDATA[ <g inkscape:groupmode="layer" id="layer2" inkscape:label="x"> ]]></style>"#,
            r#"<g inkscape:groupmode="layer" id="layer3" inkscape:label="real"/>"#,
            "</svg>",
        ];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("real", 3)]);
    }

    #[test]
    fn test_incomplete_header_is_not_committed() {
        let lines = [
            r#"<svg width="1" height="1">"#,
            r#"<g inkscape:groupmode="layer" inkscape:label="no-id"/>"#,
            r#"<g id="layer4" inkscape:label="no-marker"/>"#,
            r#"<g inkscape:groupmode="layer" id="text5" inkscape:label="bad-id"/>"#,
            r#"<g inkscape:groupmode="layer" id="layer6"/>"#,
            "</svg>",
        ];
        let outcome = scan(&lines);
        assert!(outcome.layers.is_empty());
    }

    #[test]
    fn test_quoted_gt_and_single_quotes() {
        let lines = [
            r#"<svg width="1" height="1">"#,
            r#"<g data-x="a > b" inkscape:groupmode='layer' id='layer9' inkscape:label='q'>"#,
            "</g></svg>",
        ];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("q", 9)]);
    }

    #[test]
    fn test_root_tag_attributes() {
        let lines = [r#"<svg:svg"#, r#"  width="1""#, r#"  viewBox="0 0 1 1">"#, "</svg:svg>"];
        let outcome = scan(&lines);
        let root = outcome.root.unwrap();
        assert_eq!(root.local_name(), "svg");
        assert_eq!(root.attrs, vec!["width", "viewBox"]);
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut scanner = Scanner::default();
        scanner.feed_line(0, r#"<svg width="1" height="1">"#);
        assert_eq!(scanner.state, ScanState::Outside);

        scanner.feed_line(1, r#"<g inkscape:groupmode="layer""#);
        assert!(matches!(scanner.state, ScanState::InLayerHeader(_)));

        scanner.feed_line(2, r#"   id="layer1" inkscape:label="a">"#);
        assert_eq!(scanner.state, ScanState::Committed);

        scanner.feed_line(3, "<g><rect/></g>");
        assert_eq!(scanner.state, ScanState::Committed);

        scanner.feed_line(4, "</g>");
        assert_eq!(scanner.state, ScanState::Outside);
    }

    /// Run the lexer over `line`, failing if it stops consuming bytes.
    fn lex_bounded(line: &str) -> usize {
        let mut lexer = Lexer::default();
        let mut out = Vec::new();
        let (mut i, mut idle, mut steps) = (0, 0, 0);
        while i < line.len() {
            let next = lexer.advance(line, 0, i, &mut out);
            assert!(next >= i, "lexer moved backwards at byte {i} of {line:?}");
            idle = if next == i { idle + 1 } else { 0 };
            assert!(idle <= 2, "lexer stalled at byte {i} of {line:?}");
            i = next;
            steps += 1;
        }
        steps
    }

    #[test]
    fn test_lexer_always_moves_forward() {
        let odd = ["\u{a0}", "\u{2003}", "\u{3000}", "\u{85}", "\u{feff}", "\x0c", "=", "/", "==", "é"];
        for ch in odd {
            for line in [
                format!(r#"<g{ch}inkscape:groupmode="layer" id="layer1" inkscape:label="a"/>"#),
                format!(r#"<g inkscape:groupmode="layer"{ch}id="layer1" inkscape:label="a"/>"#),
                format!(r#"<g inkscape:groupmode{ch}="layer" id={ch}"layer1"/>"#),
                format!(r#"<g {ch} a{ch}b {ch}>"#),
                format!("<{ch}"),
            ] {
                assert!(lex_bounded(&line) <= 3 * line.len() + 3);
            }
        }
    }

    #[test]
    fn test_non_ascii_space_is_part_of_the_name() {
        let lines = [
            r#"<svg width="1" height="1">"#,
            "<g\u{a0}inkscape:groupmode=\"layer\" id=\"layer1\" inkscape:label=\"a\"/>",
            r#"<g inkscape:groupmode="layer" id="layer2" inkscape:label="b"/>"#,
            "</svg>",
        ];
        let outcome = scan(&lines);
        assert_eq!(labels(&outcome), vec![("b", 2)]);
    }
}
