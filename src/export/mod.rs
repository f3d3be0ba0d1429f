//! Export functionality: CSV reports and raw spreadsheet attachments.

pub mod attachment;
pub mod csv;

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SalesMailError};

/// Create `path` exclusively, or the first free `{stem}_{n}.{ext}` sibling.
///
/// The counter starts at 1 and has no upper bound. Because creation uses
/// `create_new`, an existing file is never opened for writing.
pub fn reserve_unique_file(path: &Path) -> Result<(PathBuf, File)> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut candidate = path.to_path_buf();
    let mut counter: u64 = 0;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                if counter > 0 {
                    tracing::debug!(
                        requested = %path.display(),
                        actual = %candidate.display(),
                        "Name taken, using suffix"
                    );
                }
                return Ok((candidate, file));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter += 1;
                candidate = if ext.is_empty() {
                    parent.join(format!("{stem}_{counter}"))
                } else {
                    parent.join(format!("{stem}_{counter}.{ext}"))
                };
            }
            Err(e) => return Err(SalesMailError::io(&candidate, e)),
        }
    }
}
