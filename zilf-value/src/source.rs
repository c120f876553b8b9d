// zilf-value - Source positions and value metadata
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Source-position metadata carried by compound values.

use std::fmt;
use std::rc::Rc;

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceLine {
    /// Produced by the engine or a host with no position to report.
    #[default]
    Unknown,
    /// Read from a file.
    File { path: Rc<str>, line: u32 },
}

impl SourceLine {
    pub fn file(path: impl Into<Rc<str>>, line: u32) -> Self {
        SourceLine::File {
            path: path.into(),
            line,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, SourceLine::Unknown)
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLine::Unknown => f.write_str("<unknown>"),
            SourceLine::File { path, line } => write!(f, "{}:{}", path, line),
        }
    }
}

/// Metadata attached to LIST, FORM, VECTOR and ADECL values.
///
/// Metadata never affects equality.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    pub source: SourceLine,
    /// Set on values produced by macro expansion rather than read from source.
    pub expanded: bool,
}

impl Meta {
    pub fn at(source: SourceLine) -> Self {
        Meta {
            source,
            expanded: false,
        }
    }

    pub fn expanded_from(source: SourceLine) -> Self {
        Meta {
            source,
            expanded: true,
        }
    }
}
