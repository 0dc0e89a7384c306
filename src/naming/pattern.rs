//! Output path templates.
//!
//! A pattern is an ordered list of segments, each a literal or a token.
//! Tokens without a value are dropped together with the glue bound to them,
//! so no cleanup of stray separators is ever needed.
//!
//! The standard layout is:
//!
//! ```text
//! {DIR}/ {BASENAME} -{CONT_INDEX} -{SRC_INDEX} -{SRC_LABEL} .{EXT}
//! ```
//!
//! `out`, `diagram`, 3, 7, `bg`, `pdf` → `out/diagram-03-07-bg.pdf`

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholders understood by [`OutputPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Dir,
    Basename,
    ContIndex,
    SrcIndex,
    SrcLabel,
    Ext,
}

impl Token {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dir => "DIR",
            Self::Basename => "BASENAME",
            Self::ContIndex => "CONT_INDEX",
            Self::SrcIndex => "SRC_INDEX",
            Self::SrcLabel => "SRC_LABEL",
            Self::Ext => "EXT",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal text bound to a token, elided with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glue {
    None,
    /// Emitted before the value only when the file name built so far is
    /// non-empty (`diagram` + `-03`, but a bare `03`).
    Joiner(&'static str),
    /// Always emitted before the value.
    Fixed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token { token: Token, glue: Glue },
}

impl Segment {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub const fn token(token: Token) -> Self {
        Self::Token {
            token,
            glue: Glue::None,
        }
    }

    pub const fn joined(token: Token, joiner: &'static str) -> Self {
        Self::Token {
            token,
            glue: Glue::Joiner(joiner),
        }
    }

    pub const fn fixed(token: Token, prefix: &'static str) -> Self {
        Self::Token {
            token,
            glue: Glue::Fixed(prefix),
        }
    }
}

/// Values substituted into a pattern. Unset fields elide their token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternValues {
    pub dir: Option<PathBuf>,
    pub basename: Option<String>,
    /// 1-based position across all processed layers.
    pub cont_index: Option<usize>,
    pub src_index: Option<u32>,
    pub src_label: Option<String>,
    pub ext: Option<String>,
}

impl PatternValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = Some(basename.into());
        self
    }

    pub fn cont_index(mut self, index: usize) -> Self {
        self.cont_index = Some(index);
        self
    }

    pub fn src_index(mut self, index: u32) -> Self {
        self.src_index = Some(index);
        self
    }

    pub fn src_label(mut self, label: impl Into<String>) -> Self {
        self.src_label = Some(label.into());
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    /// Formatted value of `token`, `None` when absent or blank.
    fn render(&self, token: Token) -> Option<String> {
        let text = match token {
            Token::Dir => {
                let dir = self.dir.as_ref()?.to_string_lossy().into_owned();
                if dir.is_empty() {
                    return None;
                }
                let trimmed = dir.trim_end_matches(['/', '\\']);
                format!("{trimmed}/")
            }
            Token::Basename => self.basename.clone()?,
            Token::ContIndex => format!("{:02}", self.cont_index?),
            Token::SrcIndex => format!("{:02}", self.src_index?),
            Token::SrcLabel => sanitize_label(self.src_label.as_deref()?),
            Token::Ext => self.ext.as_deref()?.trim_start_matches('.').to_owned(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// A resolved name that cannot be used as an output path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("output name `{path}` is only an extension, no file name or directory was given")]
    OnlyExtension { path: String },

    #[error("output name `{path}` is a directory plus an extension, no file name was given")]
    OnlyDirAndExtension { path: String },

    #[error("output name `{path}` has no file name")]
    MissingFileName { path: String },

    #[error("output name is empty")]
    Empty,
}

/// Immutable token template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPattern {
    segments: Vec<Segment>,
}

impl Default for OutputPattern {
    fn default() -> Self {
        Self::standard()
    }
}

impl OutputPattern {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// `{DIR}/{BASENAME}-{CONT_INDEX}-{SRC_INDEX}-{SRC_LABEL}.{EXT}`
    pub fn standard() -> Self {
        Self::new(vec![
            Segment::token(Token::Dir),
            Segment::token(Token::Basename),
            Segment::joined(Token::ContIndex, "-"),
            Segment::joined(Token::SrcIndex, "-"),
            Segment::joined(Token::SrcLabel, "-"),
            Segment::fixed(Token::Ext, "."),
        ])
    }

    /// Substitute `values` and validate the result.
    pub fn resolve(&self, values: &PatternValues) -> Result<PathBuf, PatternError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token { token, glue } => {
                    let Some(value) = values.render(*token) else {
                        continue;
                    };
                    match glue {
                        Glue::None => {}
                        Glue::Joiner(joiner) => {
                            if !file_name_part(&out).is_empty() {
                                out.push_str(joiner);
                            }
                        }
                        Glue::Fixed(prefix) => out.push_str(prefix),
                    }
                    out.push_str(&value);
                }
            }
        }

        validate(out).map(PathBuf::from)
    }
}

fn validate(path: String) -> Result<String, PatternError> {
    if path.is_empty() {
        return Err(PatternError::Empty);
    }
    let file = file_name_part(&path);
    if file.is_empty() {
        return Err(PatternError::MissingFileName { path });
    }
    if file.starts_with('.') {
        return if path.contains('/') {
            Err(PatternError::OnlyDirAndExtension { path })
        } else {
            Err(PatternError::OnlyExtension { path })
        };
    }
    Ok(path)
}

/// Text after the last directory separator.
fn file_name_part(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Keep a label from introducing directories.
fn sanitize_label(label: &str) -> String {
    label.replace(['/', '\\'], "_")
}
