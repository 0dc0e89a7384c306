//! Non-fatal naming diagnostics.

use std::fmt;

/// Naming flags that only apply when splitting into layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingFlag {
    ContIndex,
    SrcIndex,
    SrcLabel,
}

impl NamingFlag {
    pub const ALL: [Self; 3] = [Self::ContIndex, Self::SrcIndex, Self::SrcLabel];

    pub const fn as_flag(self) -> &'static str {
        match self {
            Self::ContIndex => "--cont-index",
            Self::SrcIndex => "--src-index",
            Self::SrcLabel => "--src-label",
        }
    }
}

impl fmt::Display for NamingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

/// Why a layer naming flag has no effect on this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    LayersDisabled,
    NotEnoughLayers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingWarning {
    /// A layer naming flag was given but output is a single file.
    IgnoredLayerFlag {
        flag: NamingFlag,
        reason: IgnoreReason,
    },
    /// Layers are split but no flag tells the outputs apart.
    NoLayerNamingFlag,
}

impl fmt::Display for NamingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoredLayerFlag { flag, reason } => {
                let why = match reason {
                    IgnoreReason::LayersDisabled => "layer processing is disabled",
                    IgnoreReason::NotEnoughLayers => "the document has fewer than two layers",
                };
                write!(f, "`{flag}` ignored: {why}")
            }
            Self::NoLayerNamingFlag => write!(
                f,
                "no layer naming flag given, numbering outputs as if `{}` was set",
                NamingFlag::ContIndex
            ),
        }
    }
}
