//! Row splitting on top of `csv_core`.
//!
//! [`RowSplitter`] pulls bytes from a [`BufRead`], feeds them to a
//! `csv_core::Reader` and hands back one row of fields at a time. The raw
//! bytes csv_core consumes are also scanned to keep an exact count of
//! physical lines (LF, CRLF or bare CR) and to reject quoting that csv_core
//! would otherwise accept leniently.

use std::io::BufRead;

use csv_core::ReadRecordResult;

use crate::error::{Error, Result};

const DATA_BUFFER_SIZE: usize = 4 * 1024;
const END_BUFFER_SIZE: usize = 64;

const QUOTE: u8 = b'"';

/// One decoded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<String>,
    /// Physical line the row starts on.
    pub line: u64,
}

/// Physical line bookkeeping for consumed input.
#[derive(Debug, Default, Clone, Copy)]
struct LineCounter {
    ended: u64,
    /// A `\r` was seen; it ends a line whether or not `\n` follows.
    pending_cr: bool,
    /// Bytes consumed since the last line terminator.
    partial: bool,
}

impl LineCounter {
    fn push(&mut self, b: u8) {
        if self.pending_cr {
            self.pending_cr = false;
            if b != b'\n' {
                self.ended += 1;
            }
        }
        match b {
            b'\n' => {
                self.ended += 1;
                self.partial = false;
            }
            b'\r' => {
                self.pending_cr = true;
                self.partial = false;
            }
            _ => self.partial = true,
        }
    }

    /// Lines touched so far. A trailing line without terminator counts.
    fn lines(&self) -> u64 {
        self.ended + u64::from(self.pending_cr || self.partial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Inside a quoted field, just after a quote: either the closing quote
    /// or the first half of `""`.
    QuoteInQuoted,
}

/// Byte-level view of the row being decoded.
#[derive(Debug)]
struct Scanner {
    delimiter: u8,
    lines: LineCounter,
    quote: QuoteState,
    start_line: Option<u64>,
    error: Option<&'static str>,
}

impl Scanner {
    fn new(delimiter: u8) -> Self {
        Scanner {
            delimiter,
            lines: LineCounter::default(),
            quote: QuoteState::FieldStart,
            start_line: None,
            error: None,
        }
    }

    fn begin_row(&mut self) {
        self.quote = QuoteState::FieldStart;
        self.start_line = None;
        self.error = None;
    }

    fn observe(&mut self, consumed: &[u8]) {
        for &b in consumed {
            self.push(b);
        }
    }

    fn push(&mut self, b: u8) {
        use QuoteState::*;

        self.lines.push(b);
        let terminator = b == b'\n' || b == b'\r';
        // csv_core skips line terminators before a row.
        if self.start_line.is_none() && !terminator {
            self.start_line = Some(self.lines.lines());
        }

        let boundary = terminator || b == self.delimiter;
        self.quote = match (self.quote, b) {
            (Quoted, QUOTE) => QuoteInQuoted,
            (Quoted, _) => Quoted,
            (QuoteInQuoted, QUOTE) => Quoted,
            (FieldStart, QUOTE) => Quoted,
            (Unquoted, QUOTE) => {
                self.fail("bare quote in unquoted field");
                Unquoted
            }
            (QuoteInQuoted, _) if !boundary => {
                self.fail("extraneous data after closing quote");
                Unquoted
            }
            _ if boundary => FieldStart,
            _ => Unquoted,
        };
    }

    fn fail(&mut self, reason: &'static str) {
        self.error.get_or_insert(reason);
    }

    /// Problem with the row consumed since `begin_row`, if any.
    fn row_error(&self) -> Option<&'static str> {
        if self.quote == QuoteState::Quoted {
            return Some("unterminated quoted field");
        }
        self.error
    }
}

#[derive(Debug)]
pub struct RowSplitter<R> {
    input: R,
    core: csv_core::Reader,
    /// Field data for the row being decoded.
    buffer: Vec<u8>,
    /// End offsets for fields in `buffer`.
    ends: Vec<usize>,
    scan: Scanner,
    done: bool,
}

impl<R: BufRead> RowSplitter<R> {
    pub fn new(input: R, delimiter: u8) -> Self {
        RowSplitter {
            input,
            core: csv_core::ReaderBuilder::new().delimiter(delimiter).build(),
            buffer: vec![0; DATA_BUFFER_SIZE],
            ends: vec![0; END_BUFFER_SIZE],
            scan: Scanner::new(delimiter),
            done: false,
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.scan.delimiter
    }

    /// Physical lines consumed from the input so far.
    pub fn lines(&self) -> u64 {
        self.scan.lines.lines()
    }

    /// Decode the next row, or `None` once the input is exhausted.
    ///
    /// A quote outside the positions the format allows, or a quoted field
    /// left open at end of input, is reported as [`Error::MalformedRecord`].
    /// The row's bytes are consumed either way, so the next call starts on
    /// the following row.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if self.done {
            return Ok(None);
        }

        let mut buffer_len = 0;
        let mut ends_len = 0;
        self.scan.begin_row();

        loop {
            // An empty slice tells csv_core the input has ended.
            let input = self.input.fill_buf()?;

            let (result, bytes_read, bytes_written, ends_written) = self.core.read_record(
                input,
                &mut self.buffer[buffer_len..],
                &mut self.ends[ends_len..],
            );

            self.scan.observe(&input[..bytes_read]);
            self.input.consume(bytes_read);

            buffer_len += bytes_written;
            ends_len += ends_written;

            match result {
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let len = self.buffer.len();
                    self.buffer.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len();
                    self.ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => {
                    let line = self.scan.start_line.unwrap_or_else(|| self.lines());
                    if let Some(reason) = self.scan.row_error() {
                        return Err(Error::MalformedRecord { line, reason });
                    }
                    let fields = self.fields(ends_len, line)?;
                    return Ok(Some(Row { fields, line }));
                }
                ReadRecordResult::End => {
                    self.done = true;
                    return Ok(None);
                }
            }
        }
    }

    fn fields(&self, ends_len: usize, line: u64) -> Result<Vec<String>> {
        let mut fields = Vec::with_capacity(ends_len);
        let mut start = 0;
        for (idx, &end) in self.ends[..ends_len].iter().enumerate() {
            let field = std::str::from_utf8(&self.buffer[start..end])
                .map_err(|_| Error::InvalidUtf8 { line, field: idx })?;
            fields.push(field.to_string());
            start = end;
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_all(input: &str, delimiter: u8) -> Vec<Row> {
        let mut splitter = RowSplitter::new(input.as_bytes(), delimiter);
        let mut rows = Vec::new();
        while let Some(row) = splitter.read_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    fn fields(rows: &[Row]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.fields.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_simple_rows() {
        let rows = split_all("a,bb,ccc\nd,e,f\n", b',');
        assert_eq!(fields(&rows), vec![vec!["a", "bb", "ccc"], vec!["d", "e", "f"]]);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_last_row_without_newline() {
        let mut splitter = RowSplitter::new("a,b\nc,d".as_bytes(), b',');
        splitter.read_row().unwrap().unwrap();
        assert_eq!(splitter.lines(), 1);
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["c", "d"]);
        assert_eq!(splitter.lines(), 2);
        assert!(splitter.read_row().unwrap().is_none());
        assert!(splitter.read_row().unwrap().is_none());
    }

    #[test]
    fn test_quoted_delimiter_and_escaped_quote() {
        let rows = split_all("col1,\"a,b\",\"say \"\"hi\"\"\"\n", b',');
        assert_eq!(fields(&rows), vec![vec!["col1", "a,b", "say \"hi\""]]);
    }

    #[test]
    fn test_embedded_newline_counts_lines() {
        let mut splitter = RowSplitter::new("a,\"x\ny\"\nb,z\n".as_bytes(), b',');
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["a", "x\ny"]);
        assert_eq!(row.line, 1);
        assert_eq!(splitter.lines(), 2);

        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.line, 3);
        assert_eq!(splitter.lines(), 3);
    }

    #[test]
    fn test_crlf_counts_like_lf() {
        let mut splitter = RowSplitter::new("a,b\r\nc,d\r\ne,f\r\n".as_bytes(), b',');
        for expected in 1..=3 {
            let row = splitter.read_row().unwrap().unwrap();
            assert_eq!(row.line, expected);
            assert_eq!(splitter.lines(), expected);
        }
        assert!(splitter.read_row().unwrap().is_none());
    }

    #[test]
    fn test_bare_cr_counts_lines() {
        let mut splitter = RowSplitter::new("a,b\r1,2\r3,4\r5,6\r".as_bytes(), b',');
        for expected in 1..=4 {
            let row = splitter.read_row().unwrap().unwrap();
            assert_eq!(row.line, expected);
            assert_eq!(splitter.lines(), expected);
        }
        assert!(splitter.read_row().unwrap().is_none());
    }

    #[test]
    fn test_bare_cr_blank_lines_and_no_final_terminator() {
        let mut splitter = RowSplitter::new("a,b\r\r\rc,d".as_bytes(), b',');
        splitter.read_row().unwrap().unwrap();
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["c", "d"]);
        assert_eq!(row.line, 4);
        assert_eq!(splitter.lines(), 4);
    }

    #[test]
    fn test_crlf_split_across_reads() {
        // A one-byte buffer hands csv_core the `\r` and `\n` separately.
        let input = std::io::BufReader::with_capacity(1, "a,b\r\nc,d\r\n".as_bytes());
        let mut splitter = RowSplitter::new(input, b',');
        splitter.read_row().unwrap().unwrap();
        assert_eq!(splitter.lines(), 1);
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.line, 2);
        assert_eq!(splitter.lines(), 2);
        assert!(splitter.read_row().unwrap().is_none());
        assert_eq!(splitter.lines(), 2);
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let mut splitter = RowSplitter::new("a,b\n\n\nc,d\n".as_bytes(), b',');
        splitter.read_row().unwrap().unwrap();
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["c", "d"]);
        assert_eq!(row.line, 4);
        assert_eq!(splitter.lines(), 4);
    }

    #[test]
    fn test_other_delimiters() {
        assert_eq!(fields(&split_all("a\tb|c\n", b'\t')), vec![vec!["a", "b|c"]]);
        assert_eq!(fields(&split_all("a\tb|c\n", b'|')), vec![vec!["a\tb", "c"]]);
    }

    #[test]
    fn test_unterminated_quote() {
        let mut splitter = RowSplitter::new("a,b\nc,\"open\nstill open\n".as_bytes(), b',');
        splitter.read_row().unwrap().unwrap();
        let err = splitter.read_row().unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }));
        assert!(splitter.read_row().unwrap().is_none());
    }

    #[test]
    fn test_bare_quote_then_recovery() {
        let mut splitter = RowSplitter::new("a\"b,c\nd,e\n".as_bytes(), b',');
        let err = splitter.read_row().unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 1, .. }));
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["d", "e"]);
        assert_eq!(row.line, 2);
    }

    #[test]
    fn test_data_after_closing_quote() {
        let mut splitter = RowSplitter::new("\"a\"b,c\nd,e\n".as_bytes(), b',');
        let err = splitter.read_row().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord {
                line: 1,
                reason: "extraneous data after closing quote"
            }
        ));
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["d", "e"]);
    }

    #[test]
    fn test_even_bare_quotes_are_rejected() {
        let mut splitter = RowSplitter::new("a\"b\"c,d\n".as_bytes(), b',');
        let err = splitter.read_row().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord {
                line: 1,
                reason: "bare quote in unquoted field"
            }
        ));
    }

    #[test]
    fn test_quoted_fields_ending_row_and_input() {
        let rows = split_all("\"a\",\"b\"\r\n\"\",\"c\"\"\"\"\"", b',');
        assert_eq!(fields(&rows), vec![vec!["a", "b"], vec!["", "c\"\""]]);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_quoted_bare_cr_counts_as_line() {
        let mut splitter = RowSplitter::new("a,\"x\ry\"\nb,z\n".as_bytes(), b',');
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.fields, vec!["a", "x\ry"]);
        assert_eq!(splitter.lines(), 2);
        let row = splitter.read_row().unwrap().unwrap();
        assert_eq!(row.line, 3);
    }

    #[test]
    fn test_large_field_grows_buffer() {
        let big = "x".repeat(DATA_BUFFER_SIZE * 3);
        let input = format!("{big},y\n");
        let rows = split_all(&input, b',');
        assert_eq!(rows[0].fields[0].len(), big.len());
        assert_eq!(rows[0].fields[1], "y");
    }

    #[test]
    fn test_many_fields_grow_ends() {
        let input = (0..END_BUFFER_SIZE * 4)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let rows = split_all(&input, b',');
        assert_eq!(rows[0].fields.len(), END_BUFFER_SIZE * 4);
        let middle = END_BUFFER_SIZE * 2;
        assert_eq!(rows[0].fields[middle], middle.to_string());
    }

    #[test]
    fn test_invalid_utf8() {
        let input: &[u8] = b"ok,\xff\xfe\n";
        let mut splitter = RowSplitter::new(input, b',');
        let err = splitter.read_row().unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { line: 1, field: 1 }));
    }

    #[test]
    fn test_empty_input() {
        let mut splitter = RowSplitter::new("".as_bytes(), b',');
        assert!(splitter.read_row().unwrap().is_none());
        assert_eq!(splitter.lines(), 0);
    }
}
