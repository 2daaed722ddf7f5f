//! # delimited-reader
//!
//! Reads comma, tab or pipe separated text as a stream of records keyed by
//! column name.
//!
//! ## Overview
//!
//! - **Delimiter**: given explicitly, or derived from the file extension
//!   (`.csv`, `.tsv`, `.tab`, `.pipe`)
//! - **Header**: explicit column names, a literal header line, or the first
//!   line of the stream
//! - **Records**: one row at a time, each carrying its record number and the
//!   number of physical lines consumed so far
//!
//! Fields follow the usual double-quote rules: a quoted field may contain the
//! delimiter or newlines, and `""` inside quotes is a literal quote.
//!
//! ## Example
//!
//! ```
//! use delimited_reader::Reader;
//!
//! let input = "last,dept\nSMITH,SALES\nJONES,\"R&D, West\"\n";
//! let mut reader = Reader::new(input.as_bytes(), b',').unwrap();
//! assert_eq!(reader.columns(), ["last", "dept"]);
//!
//! let record = reader.read_next().unwrap().unwrap();
//! assert_eq!((record.record_number, record.line_number), (1, 2));
//! assert_eq!(record.get("dept"), Some("SALES"));
//!
//! let record = reader.read_next().unwrap().unwrap();
//! assert_eq!(record.get("dept"), Some("R&D, West"));
//!
//! // End of stream.
//! assert!(reader.read_next().unwrap().is_none());
//! ```

pub mod config;
pub mod delimiter;
pub mod error;
pub mod reader;
pub mod source;
mod splitter;

pub use config::{Config, HeaderSource};
pub use error::{Error, ReadAllError, Result};
pub use reader::{HeaderInput, Reader, Record};
pub use source::{FileReader, open, open_with};
