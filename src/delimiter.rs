//! Field delimiter resolution.
//!
//! An explicit delimiter always wins. Otherwise the delimiter is derived
//! from the file extension:
//!
//! | extension | delimiter |
//! |-----------|-----------|
//! | `.csv`    | `,`       |
//! | `.tsv`    | tab       |
//! | `.tab`    | tab       |
//! | `.pipe`   | `\|`      |

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const COMMA: u8 = b',';
pub const TAB: u8 = b'\t';
pub const PIPE: u8 = b'|';

/// Resolve the delimiter for `path`, honoring an explicit override.
///
/// The explicit delimiter is returned unchanged; it is not checked for
/// suitability.
pub fn resolve(path: Option<&Path>, explicit: Option<u8>) -> Result<u8> {
    if let Some(delimiter) = explicit {
        return Ok(delimiter);
    }

    let ext = path
        .and_then(Path::extension)
        .ok_or(Error::NoExtension)?
        .to_string_lossy();

    let delimiter = match ext.as_ref() {
        "csv" => COMMA,
        "tsv" | "tab" => TAB,
        "pipe" => PIPE,
        other => return Err(Error::UnknownExtension(format!(".{other}"))),
    };

    debug!(
        extension = %ext,
        delimiter = %(delimiter as char).escape_default(),
        "derived delimiter"
    );
    Ok(delimiter)
}
