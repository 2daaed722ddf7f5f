//! Record reader.
//!
//! A [`Reader`] resolves its column names once, at construction, and then
//! decodes one row per [`Reader::read_next`] call into a [`Record`] keyed by
//! those names. It owns the line and record counters for its stream.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead, Cursor, Read};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::HeaderSource;
use crate::error::{Error, ReadAllError, Result};
use crate::splitter::RowSplitter;

/// Input with an optional header line chained in front of it.
pub type HeaderInput<R> = io::Chain<Cursor<Vec<u8>>, R>;

/// One decoded data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Data records produced so far by the reader, this one included.
    pub record_number: u64,
    /// Physical lines consumed so far, header and this row included.
    pub line_number: u64,
    pub values: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// Reads delimited rows as [`Record`]s.
///
/// Not meant to be shared between consumers; every call mutates the
/// counters.
#[derive(Debug)]
pub struct Reader<R> {
    rows: RowSplitter<R>,
    columns: Vec<String>,
    line_number: u64,
    record_number: u64,
}

impl<R: BufRead> Reader<R> {
    /// Create a reader taking its columns from the first row of `input`.
    ///
    /// Fails with [`Error::EndOfInput`] if `input` has no rows.
    pub fn new(input: R, delimiter: u8) -> Result<Self> {
        let mut rows = RowSplitter::new(input, delimiter);
        let header = rows.read_row()?.ok_or(Error::EndOfInput)?;
        Self::build(rows, header.fields)
    }

    /// Create a reader with explicit column names. The first row of `input`
    /// is read as data.
    pub fn with_columns(input: R, delimiter: u8, columns: Vec<String>) -> Result<Self> {
        Self::build(RowSplitter::new(input, delimiter), columns)
    }

    fn build(rows: RowSplitter<R>, columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(Error::DuplicateColumn(dup.clone()));
        }

        let line_number = rows.lines();
        debug!(columns = ?columns, line_number, "resolved header");

        Ok(Reader {
            rows,
            columns,
            line_number,
            record_number: 0,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn delimiter(&self) -> u8 {
        self.rows.delimiter()
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn record_number(&self) -> u64 {
        self.record_number
    }

    /// Decode the next row.
    ///
    /// Returns `Ok(None)` at end of stream, and keeps returning it. A failed
    /// row leaves `record_number` untouched; `line_number` still moves past
    /// the lines the row occupied, so reading can continue after it.
    pub fn read_next(&mut self) -> Result<Option<Record>> {
        let row = self.rows.read_row();
        self.line_number = self.rows.lines();

        let Some(row) = row? else {
            trace!(line_number = self.line_number, "end of stream");
            return Ok(None);
        };

        if row.fields.len() != self.columns.len() {
            return Err(Error::FieldCountMismatch {
                line: row.line,
                expected: self.columns.len(),
                actual: row.fields.len(),
            });
        }

        self.record_number += 1;
        let values = self.columns.iter().cloned().zip(row.fields).collect();

        Ok(Some(Record {
            record_number: self.record_number,
            line_number: self.line_number,
            values,
        }))
    }

    /// Read every remaining record.
    ///
    /// Stops at the first error; the records read before it are returned
    /// inside the [`ReadAllError`].
    pub fn read_all(&mut self) -> Result<Vec<Record>, ReadAllError> {
        let mut records = Vec::new();
        loop {
            match self.read_next() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => return Ok(records),
                Err(source) => return Err(ReadAllError { records, source }),
            }
        }
    }
}

impl<R: BufRead> Reader<HeaderInput<R>> {
    /// Create a reader whose columns come from `header`.
    ///
    /// For [`HeaderSource::Text`] the text is read as a virtual first line
    /// ahead of `input`, so line numbers stay aligned with a file that had
    /// the header written into it.
    pub fn from_source(input: R, delimiter: u8, header: HeaderSource) -> Result<Self> {
        match header {
            HeaderSource::Columns(columns) => {
                Reader::with_columns(Cursor::new(Vec::new()).chain(input), delimiter, columns)
            }
            HeaderSource::Text(text) => {
                let mut line = text.trim_end_matches(['\r', '\n']).as_bytes().to_vec();
                line.push(b'\n');
                Reader::new(Cursor::new(line).chain(input), delimiter)
            }
            HeaderSource::FirstLine => Reader::new(Cursor::new(Vec::new()).chain(input), delimiter),
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
