//! Grammar source locations.
//!
//! Runtime errors raised while evaluating semantic actions are decorated
//! with the location of the offending grammar construct, as recorded by the
//! grammar compiler in label metadata. Lines and columns are 1-based; a
//! missing column (0) renders as a line-only location.

use std::fmt;

/// A position in a grammar source file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLoc {
    /// Opaque file name, empty for in-memory grammars.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, 0 when unknown.
    pub column: u32,
}

impl SourceLoc {
    /// Creates a location from a file name and 1-based line/column pair.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        SourceLoc {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column == 0 {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}
