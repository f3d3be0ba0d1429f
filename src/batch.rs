//! Batch processing: every `.eml` in a directory through extraction,
//! normalization and CSV output.
//!
//! Items are processed one after another. A failure is recorded on the item
//! it belongs to and never stops the run.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SalesMailError};
use crate::export::attachment::save_payload;
use crate::export::csv::{save_report, CsvOptions};
use crate::model::attachment::AttachmentPayload;
use crate::model::outcome::{AttachmentReport, BatchSummary, ContainerReport, ContainerStatus};
use crate::parser::eml;
use crate::parser::mime::ExtractOptions;
use crate::report::normalize::{normalize_file, ReportOptions};

/// Everything a batch run needs; nothing is read from the process environment.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory scanned for `.eml` files.
    pub input_dir: PathBuf,
    /// Directory receiving CSV files (created if missing).
    pub output_dir: PathBuf,
    /// Root for per-message staging directories; system temp dir when `None`.
    pub staging_dir: Option<PathBuf>,
    /// Attachment selection.
    pub extract: ExtractOptions,
    /// Report layout.
    pub report: ReportOptions,
    /// CSV dialect.
    pub csv: CsvOptions,
}

impl BatchOptions {
    /// Options with default layout and dialect for the given directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            staging_dir: None,
            extract: ExtractOptions::default(),
            report: ReportOptions::default(),
            csv: CsvOptions::default(),
        }
    }
}

/// List the `.eml` files directly inside `input_dir`, sorted by path.
pub fn discover_containers(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(SalesMailError::FileNotFound(input_dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(input_dir).map_err(|e| SalesMailError::io(input_dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SalesMailError::io(input_dir, e))?.path();
        if path.is_file() && eml::is_eml_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    debug!(dir = %input_dir.display(), count = paths.len(), "Discovered containers");
    Ok(paths)
}

/// Run the whole batch.
///
/// The progress callback receives `(current, total)` before each container
/// and once more with `(total, total)` at the end.
pub fn run_batch(options: &BatchOptions, progress: &dyn Fn(usize, usize)) -> Result<BatchSummary> {
    let containers = discover_containers(&options.input_dir)?;
    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| SalesMailError::io(&options.output_dir, e))?;

    let mut summary = BatchSummary {
        output_dir: options.output_dir.clone(),
        ..BatchSummary::default()
    };
    let total = containers.len();

    for (i, path) in containers.iter().enumerate() {
        progress(i, total);
        summary.push(process_container(path, options));
    }
    progress(total, total);

    info!(
        successful = summary.successful,
        failed = summary.failed,
        "Batch finished"
    );
    Ok(summary)
}

/// Process one email container end to end.
///
/// Spreadsheets are staged in a temporary directory that is removed when
/// this function returns, whatever the outcome.
pub fn process_container(path: &Path, options: &BatchOptions) -> ContainerReport {
    info!(path = %path.display(), "Processing container");

    let extraction = match eml::extract_from_file(path, &options.extract) {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Container rejected");
            return ContainerReport::failed(path.to_path_buf(), &e);
        }
    };

    let mut report = ContainerReport {
        source: path.to_path_buf(),
        status: ContainerStatus::Processed,
        attachments: Vec::new(),
        skipped: extraction.skipped,
    };

    if extraction.payloads.is_empty() {
        warn!(path = %path.display(), "No spreadsheet attachments");
        report.status = ContainerStatus::NoSpreadsheets;
        return report;
    }

    let staging = match create_staging_dir(path, options.staging_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot create staging directory");
            return ContainerReport {
                skipped: report.skipped,
                ..ContainerReport::failed(path.to_path_buf(), &e)
            };
        }
    };

    for payload in &extraction.payloads {
        match stage_and_convert(payload, staging.path(), options) {
            Ok(attachment) => report.attachments.push(attachment),
            Err(e) => {
                warn!(filename = %payload.filename, error = %e, "Attachment rejected");
                report
                    .attachments
                    .push(AttachmentReport::rejected(&payload.filename, &e));
            }
        }
    }

    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!(dir = %staging_path.display(), error = %e, "Could not clean up staging directory");
    }

    report
}

/// Stage one payload on disk, normalize it and write the CSV.
fn stage_and_convert(
    payload: &AttachmentPayload,
    staging: &Path,
    options: &BatchOptions,
) -> Result<AttachmentReport> {
    let staged = save_payload(payload, staging)?;
    debug!(staged = %staged.display(), "Staged attachment");

    let normalized = normalize_file(&staged, &options.report)?;
    let written = save_report(&normalized, &options.output_dir, &options.csv)?;

    Ok(AttachmentReport::written(
        &payload.filename,
        written,
        normalized.table.row_count(),
        normalized.table.column_count(),
    ))
}

/// Create a fresh staging directory named after the container.
fn create_staging_dir(container: &Path, root: Option<&Path>) -> Result<tempfile::TempDir> {
    let stem = container
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("message");
    let prefix = format!("salesmail-{stem}-");
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);

    match root {
        Some(root) => {
            std::fs::create_dir_all(root).map_err(|e| SalesMailError::io(root, e))?;
            builder.tempdir_in(root).map_err(|e| SalesMailError::io(root, e))
        }
        None => builder
            .tempdir()
            .map_err(|e| SalesMailError::io(std::env::temp_dir(), e)),
    }
}
