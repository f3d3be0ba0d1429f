//! Reading individual `.eml` files (RFC 5322 messages without MBOX framing).

use std::path::Path;

use crate::error::{Result, SalesMailError};
use crate::model::attachment::Extraction;
use crate::parser::mime::{self, ExtractOptions};

/// Read a whole `.eml` file into memory.
pub fn read_eml(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SalesMailError::FileNotFound(path.to_path_buf())
        } else {
            SalesMailError::io(path, e)
        }
    })
}

/// Read a `.eml` file and extract its spreadsheet attachments.
pub fn extract_from_file(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Extraction> {
    let path = path.as_ref();
    let data = read_eml(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Read container");
    mime::extract_spreadsheets(&data, options)
}

/// `true` if `path` has an `.eml` extension (any case).
pub fn is_eml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}
