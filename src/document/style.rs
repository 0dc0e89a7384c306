//! Layer attribute conventions shared by both loaders.
//!
//! Inkscape marks a layer as
//! `<g inkscape:groupmode="layer" id="layer3" inkscape:label="bg" style="display:inline">`.

use std::borrow::Cow;

/// Attribute carrying the group mode marker.
pub const GROUPMODE_ATTR: &str = "inkscape:groupmode";
/// Marker value identifying a layer group.
pub const GROUPMODE_LAYER: &str = "layer";
/// Attribute carrying the human-readable layer name.
pub const LABEL_ATTR: &str = "inkscape:label";
/// Attribute carrying the authored layer id.
pub const ID_ATTR: &str = "id";
/// Literal every layer id starts with, followed by the source index.
pub const ID_PREFIX: &str = "layer";
pub const STYLE_ATTR: &str = "style";
pub const GROUP_TAG: &str = "g";
pub const ROOT_TAG: &str = "svg";

/// CSS `display` value written when toggling a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Inline,
    None,
}

impl Display {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::None => "none",
        }
    }
}

/// Parse the source index out of a layer id (`layer12` → 12).
pub fn parse_source_index(id: &str) -> Option<u32> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether a style declaration hides its element.
pub fn is_hidden(style: &str) -> bool {
    declarations(style).any(|(name, value)| name == "display" && value == "none")
}

/// Return `style` with its `display` declaration set to `display`.
///
/// An existing declaration is rewritten in place, otherwise one is
/// prepended. The rest of the declarations are left byte-for-byte intact.
pub fn with_display(style: &str, display: Display) -> String {
    let value = display.as_str();
    let mut offset = 0;
    for part in style.split(';') {
        let trimmed = part.trim_start();
        let lead = part.len() - trimmed.len();
        if let Some((name, rest)) = trimmed.split_once(':')
            && name.trim() == "display"
        {
            let rest_lead = rest.len() - rest.trim_start().len();
            let value_start = offset + lead + name.len() + 1 + rest_lead;
            let value_end = offset + part.len() - (rest.len() - rest.trim_end().len());
            let mut out = String::with_capacity(style.len() + value.len());
            out.push_str(&style[..value_start]);
            out.push_str(value);
            out.push_str(&style[value_end..]);
            return out;
        }
        offset += part.len() + 1;
    }

    if style.trim().is_empty() {
        format!("display:{value}")
    } else {
        format!("display:{value};{style}")
    }
}

/// Decode XML entities in an attribute value, keeping the raw text if it
/// contains a malformed reference.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Label text as registered by both loaders.
///
/// Line breaks are normalized to `\n` before entities are decoded, as an XML
/// parser does, so `&#13;` still yields a carriage return.
pub fn decode_label(raw: &str) -> String {
    if raw.contains('\r') {
        unescape(&raw.replace("\r\n", "\n").replace('\r', "\n")).into_owned()
    } else {
        unescape(raw).into_owned()
    }
}

fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        Some((name.trim(), value.trim()))
    })
}
