//! Error types for delimiter resolution, header acquisition and row decoding.

use std::io;
use std::path::PathBuf;

use crate::reader::Record;

/// Errors produced while opening or reading a delimited stream.
///
/// End of stream is not an error: [`Reader::read_next`](crate::Reader::read_next)
/// returns `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no extension to derive delimiter from")]
    NoExtension,

    /// Holds the extension with its leading dot, e.g. `.foo`.
    #[error("could not derive delimiter from '{0}' extension")]
    UnknownExtension(String),

    #[error("no header line to read columns from")]
    EndOfInput,

    #[error("malformed record starting on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: &'static str },

    #[error("record on line {line} has {actual} fields, expected {expected}")]
    FieldCountMismatch {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' appears more than once in the header")]
    DuplicateColumn(String),

    #[error("field {field} on line {line} contains invalid UTF-8 data")]
    InvalidUtf8 { line: u64, field: usize },

    #[error("failed to open '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True for failures confined to a single row. The stream stays usable
    /// and the next `read_next` call continues with the following row.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedRecord { .. }
                | Error::FieldCountMismatch { .. }
                | Error::InvalidUtf8 { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A bulk read that stopped early.
///
/// Keeps the records decoded before the failure so callers can decide what
/// to do with a partial load.
#[derive(Debug, thiserror::Error)]
#[error("read stopped after {} records: {}", .records.len(), .source)]
pub struct ReadAllError {
    pub records: Vec<Record>,
    pub source: Error,
}
