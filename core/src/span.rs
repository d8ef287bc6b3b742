//! Source positions attached to nodes by the reader.

use std::fmt;

use crate::node::Table;
use crate::value::{Key, Number, Value};

/// Where a node came from in the source text.
///
/// Every field is optional: synthetic nodes built by macros usually carry
/// only a filename, or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub filename: Option<String>,
    pub line: Option<u32>,
    pub bytestart: Option<usize>,
    pub byteend: Option<usize>,
}

impl SourceSpan {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        SourceSpan {
            filename: Some(filename.into()),
            line: Some(line),
            bytestart: None,
            byteend: None,
        }
    }

    /// Attach a byte range to this span.
    pub fn with_bytes(mut self, start: usize, end: usize) -> Self {
        self.bytestart = Some(start);
        self.byteend = Some(end);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_none()
            && self.line.is_none()
            && self.bytestart.is_none()
            && self.byteend.is_none()
    }

    /// Build a span from a source table with `filename`, `line`,
    /// `bytestart` and `byteend` fields.
    ///
    /// Only string keys are consulted. Positional entries (integer keys) and
    /// other non-string keys are dropped, as are values of the wrong type.
    pub fn from_table(source: &Table) -> Self {
        let mut span = SourceSpan::default();
        for (key, value) in source.entries() {
            let Key::Str(name) = key else {
                continue;
            };
            match (name.as_str(), value) {
                ("filename", Value::Str(file)) => span.filename = Some(file),
                ("line", Value::Number(Number::Int(n))) => {
                    span.line = u32::try_from(n).ok();
                }
                ("bytestart", Value::Number(Number::Int(n))) => {
                    span.bytestart = usize::try_from(n).ok();
                }
                ("byteend", Value::Number(Number::Int(n))) => {
                    span.byteend = usize::try_from(n).ok();
                }
                _ => {}
            }
        }
        span
    }

    /// The inverse of `from_table`: a table holding only the present fields.
    pub fn to_table(&self) -> Table {
        let table = Table::new();
        if let Some(file) = &self.filename {
            table.insert("filename", file.as_str());
        }
        if let Some(line) = self.line {
            table.insert("line", i64::from(line));
        }
        if let Some(start) = self.bytestart {
            table.insert("bytestart", start as i64);
        }
        if let Some(end) = self.byteend {
            table.insert("byteend", end as i64);
        }
        table
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename.as_deref().unwrap_or("unknown"))?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}
