//! Building a [`Reader`] from a [`Config`].
//!
//! The delimiter is resolved before anything is opened, so a configuration
//! that cannot work fails without touching the filesystem.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use tracing::debug;

use crate::config::Config;
use crate::delimiter;
use crate::error::{Error, Result};
use crate::reader::{HeaderInput, Reader};

/// Reader over a file opened by [`open`].
pub type FileReader = Reader<HeaderInput<Box<dyn BufRead>>>;

/// Open the configured file and build a reader for it.
///
/// Without a path the stream is empty, which only makes sense together with
/// explicit header text or columns.
pub fn open(config: &Config) -> Result<FileReader> {
    let delimiter = delimiter::resolve(config.path.as_deref(), config.delimiter)?;

    let input: Box<dyn BufRead> = match &config.path {
        Some(path) => {
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "opened input");
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::empty()),
    };

    Reader::from_source(input, delimiter, config.header_source())
}

/// Build a reader over a stream supplied by the caller.
///
/// `config.path` is only used for delimiter inference here.
pub fn open_with<R: BufRead>(config: &Config, input: R) -> Result<Reader<HeaderInput<R>>> {
    let delimiter = delimiter::resolve(config.path.as_deref(), config.delimiter)?;
    Reader::from_source(input, delimiter, config.header_source())
}
