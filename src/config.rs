//! Reader configuration.

use std::path::PathBuf;

/// Where the reader gets its column names from.
///
/// Variants are listed in priority order; see [`Config::header_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSource {
    /// Explicit column names. Nothing is consumed from the stream, so its
    /// first line is the first data row.
    Columns(Vec<String>),
    /// A literal header line read in front of the stream. The stream's own
    /// first line is the first data row.
    Text(String),
    /// The first row of the stream.
    FirstLine,
}

/// Options recognized by [`open`](crate::open) and [`open_with`](crate::open_with).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Input file. Also used to infer the delimiter from its extension.
    pub path: Option<PathBuf>,
    /// Explicit field delimiter. `None` means infer from `path`.
    pub delimiter: Option<u8>,
    /// Literal header line.
    pub header: Option<String>,
    /// Explicit ordered column names.
    pub columns: Option<Vec<String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Pick the header source: explicit columns, then header text, then the
    /// stream's first line. Empty header text and empty column lists count
    /// as unset.
    pub fn header_source(&self) -> HeaderSource {
        match (&self.columns, &self.header) {
            (Some(columns), _) if !columns.is_empty() => HeaderSource::Columns(columns.clone()),
            (_, Some(text)) if !text.is_empty() => HeaderSource::Text(text.clone()),
            _ => HeaderSource::FirstLine,
        }
    }
}
