//! Per-item outcomes of a batch run.
//!
//! These are plain data: the CLI decides how to print them.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ErrorKind, SalesMailError};
use crate::model::attachment::SkippedPart;

/// Final state of one extracted spreadsheet.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttachmentStatus {
    /// Normalized and written to `path`.
    Written {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
    /// Normalization or writing failed.
    Rejected { kind: ErrorKind, reason: String },
}

/// Outcome for one spreadsheet attachment.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentReport {
    /// Decoded attachment filename.
    pub filename: String,
    /// What happened to it.
    pub status: AttachmentStatus,
}

impl AttachmentReport {
    /// Report a successfully written artifact.
    pub fn written(filename: impl Into<String>, path: PathBuf, rows: usize, columns: usize) -> Self {
        Self {
            filename: filename.into(),
            status: AttachmentStatus::Written {
                path,
                rows,
                columns,
            },
        }
    }

    /// Report a rejected attachment.
    pub fn rejected(filename: impl Into<String>, error: &SalesMailError) -> Self {
        Self {
            filename: filename.into(),
            status: AttachmentStatus::Rejected {
                kind: error.kind(),
                reason: error.to_string(),
            },
        }
    }

    /// Output path, if the attachment was written.
    pub fn output_path(&self) -> Option<&PathBuf> {
        match &self.status {
            AttachmentStatus::Written { path, .. } => Some(path),
            AttachmentStatus::Rejected { .. } => None,
        }
    }
}

/// Container-level state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContainerStatus {
    /// At least one spreadsheet was extracted (see the attachment reports).
    Processed,
    /// The message parsed but carried no spreadsheet attachment.
    NoSpreadsheets,
    /// The container could not be read or parsed.
    Failed { kind: ErrorKind, reason: String },
}

/// Outcome for one email container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    /// Path of the `.eml` file.
    pub source: PathBuf,
    /// Container-level state.
    pub status: ContainerStatus,
    /// One entry per extracted spreadsheet, in extraction order.
    pub attachments: Vec<AttachmentReport>,
    /// Attachment parts skipped for undecodable filenames.
    pub skipped: Vec<SkippedPart>,
}

impl ContainerReport {
    /// A container that failed before any attachment was handled.
    pub fn failed(source: PathBuf, error: &SalesMailError) -> Self {
        Self {
            source,
            status: ContainerStatus::Failed {
                kind: error.kind(),
                reason: error.to_string(),
            },
            attachments: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// `true` when at least one CSV file was written.
    pub fn succeeded(&self) -> bool {
        self.attachments.iter().any(|a| a.output_path().is_some())
    }

    /// Paths of the CSV files written for this container.
    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.attachments.iter().filter_map(AttachmentReport::output_path)
    }
}

/// Summary of a whole batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Directory receiving the CSV files.
    pub output_dir: PathBuf,
    /// Containers that produced at least one CSV file.
    pub successful: usize,
    /// Containers that produced none.
    pub failed: usize,
    /// Per-container reports, in processing order.
    pub containers: Vec<ContainerReport>,
}

impl BatchSummary {
    /// Record one container report and update the counters.
    pub fn push(&mut self, report: ContainerReport) {
        if report.succeeded() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.containers.push(report);
    }

    /// All CSV files written during the run.
    pub fn outputs(&self) -> Vec<&PathBuf> {
        self.containers.iter().flat_map(ContainerReport::outputs).collect()
    }
}
