//! Save spreadsheet attachments to disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SalesMailError};
use crate::export::reserve_unique_file;
use crate::model::attachment::AttachmentPayload;

/// Write one payload into `output_dir` under its sanitized filename.
///
/// Avoids overwriting: a counter is appended if the name is taken.
pub fn save_payload(payload: &AttachmentPayload, output_dir: &Path) -> Result<PathBuf> {
    let filename = sanitize_filename_part(&payload.filename, 150);
    let (path, mut file) = reserve_unique_file(&output_dir.join(&filename))?;
    file.write_all(&payload.data)
        .map_err(|e| SalesMailError::io(&path, e))?;
    tracing::debug!(path = %path.display(), bytes = payload.data.len(), "Saved attachment");
    Ok(path)
}

/// Write every payload into `output_dir`, creating it if needed.
pub fn save_payloads(payloads: &[AttachmentPayload], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| SalesMailError::io(output_dir, e))?;
    payloads
        .iter()
        .map(|p| save_payload(p, output_dir))
        .collect()
}

/// Sanitize a string for use in filenames.
///
/// Replaces path separators and other unsafe characters with `_` and
/// truncates to `max_len` characters. Spaces are kept.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    let trimmed = sanitized.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}
