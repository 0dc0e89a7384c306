//! Owned XML node tree built from `quick-xml` events.
//!
//! Attribute values are kept as raw (still escaped) text so that writing the
//! tree back reproduces them exactly. Everything that is not an element
//! (text, comments, CDATA, processing instructions, doctype) is stored as the
//! original event.

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, Event, attributes::Attribute},
    name::QName,
};
use std::borrow::Cow;
use std::io;

use crate::document::LoadError;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Other(Event<'static>),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified tag name (`g`, `svg:g`, ...).
    pub name: String,
    /// `(qualified name, raw value)` pairs in document order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<name/>` while it has no children.
    pub self_closing: bool,
}

impl Element {
    fn from_start(start: &BytesStart<'_>, self_closing: bool) -> Result<Self, LoadError> {
        let name = utf8(start.name().as_ref())?.to_owned();
        let attrs = start
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(|e| malformed(format!("bad attribute in <{name}>: {e}")))?;
                Ok((
                    utf8(attr.key.as_ref())?.to_owned(),
                    utf8(&attr.value)?.to_owned(),
                ))
            })
            .collect::<Result<_, LoadError>>()?;

        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
            self_closing,
        })
    }

    /// Tag name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Raw value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, appending it when missing.
    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(|(key, _)| key.as_str())
    }

    /// Immediate element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attrs {
            // Values are stored escaped, push them as-is
            start.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: Cow::Borrowed(value.as_bytes()),
            });
        }

        if self.self_closing && self.children.is_empty() {
            return emit(writer, Event::Empty(start));
        }

        emit(writer, Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(el) => el.write(writer)?,
                Node::Other(event) => emit(writer, event.borrow())?,
            }
        }
        emit(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// A parsed document: everything before the root, the root, everything after.
#[derive(Debug, Clone)]
pub struct Tree {
    pub prolog: Vec<Event<'static>>,
    pub root: Element,
    pub epilog: Vec<Event<'static>>,
}

impl Tree {
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let node = match reader.read_event() {
                Ok(Event::Start(start)) => {
                    stack.push(Element::from_start(&start, false)?);
                    continue;
                }
                Ok(Event::Empty(start)) => Node::Element(Element::from_start(&start, true)?),
                Ok(Event::End(_)) => match stack.pop() {
                    Some(el) => Node::Element(el),
                    None => return Err(malformed("unexpected closing tag".to_string())),
                },
                Ok(Event::Eof) => break,
                Ok(event) => Node::Other(event.into_owned()),
                Err(e) => {
                    return Err(malformed(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }

            match (node, root.is_some()) {
                (Node::Element(el), false) => root = Some(el),
                (Node::Element(el), true) => {
                    return Err(malformed(format!("second root element <{}>", el.name)));
                }
                (Node::Other(event), false) => prolog.push(event),
                (Node::Other(event), true) => epilog.push(event),
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("unclosed element <{}>", open.name)));
        }

        let root = root.ok_or_else(|| malformed("no root element".to_string()))?;
        if root.local_name() != "svg" {
            return Err(malformed(format!("root element is <{}>, not <svg>", root.name)));
        }

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            emit(&mut writer, event.borrow())?;
        }
        self.root.write(&mut writer)?;
        for event in &self.epilog {
            emit(&mut writer, event.borrow())?;
        }
        Ok(writer.into_inner())
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> io::Result<()> {
    writer.write_event(event).map_err(io::Error::other)
}

fn utf8(bytes: &[u8]) -> Result<&str, LoadError> {
    std::str::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8 in markup: {e}")))
}

fn malformed(reason: String) -> LoadError {
    LoadError::MalformedContainer(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<?xml version="1.0"?>
<!-- drawing -->
<svg width="10" height="10">
  <g id="a" style="fill:red">text &amp; more</g>
  <rect x="1"/>
</svg>
"#;

    #[test]
    fn test_parse_structure() {
        let tree = Tree::parse(SVG).unwrap();
        assert_eq!(tree.root.name, "svg");
        assert!(matches!(tree.prolog.first(), Some(Event::Decl(_))));
        assert!(tree.prolog.iter().any(|e| matches!(e, Event::Comment(_))));
        let children: Vec<_> = tree.root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(children, vec!["g", "rect"]);
        assert_eq!(tree.root.attr("width"), Some("10"));
    }

    #[test]
    fn test_roundtrip_preserves_content() {
        let tree = Tree::parse(SVG).unwrap();
        let bytes = tree.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#"<g id="a" style="fill:red">text &amp; more</g>"#));
        assert!(text.contains(r#"<rect x="1"/>"#));
        assert!(text.contains("<!-- drawing -->"));

        let again = Tree::parse(&text).unwrap();
        assert_eq!(again.root, tree.root);
    }

    #[test]
    fn test_set_attr() {
        let mut tree = Tree::parse(SVG).unwrap();
        let g = tree.root.child_elements_mut().next().unwrap();
        g.set_attr("style", "display:none".to_string());
        g.set_attr("class", "x".to_string());
        assert_eq!(g.attr("style"), Some("display:none"));
        assert_eq!(g.attr_names().collect::<Vec<_>>(), vec!["id", "style", "class"]);
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(Tree::parse("<svg><g></svg>").is_err());
        assert!(Tree::parse("<html></html>").is_err());
        assert!(Tree::parse("<svg/><svg/>").is_err());
        assert!(Tree::parse("just text").is_err());
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let tree = Tree::parse(r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"/>"#).unwrap();
        assert_eq!(tree.root.local_name(), "svg");
    }
}
