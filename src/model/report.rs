//! Normalized report types.

use chrono::NaiveDate;

/// Name of the first derived column.
pub const PERIOD_START_COLUMN: &str = "Period_Start";

/// Name of the second derived column.
pub const PERIOD_END_COLUMN: &str = "Period_End";

/// Reporting period found in a title cell.
///
/// `start` may be after `end`; the order is not validated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    /// Parsed start date.
    pub start: NaiveDate,

    /// Parsed end date.
    pub end: NaiveDate,

    /// Start date exactly as written in the title (`dd/mm/yyyy`).
    pub start_text: String,

    /// End date exactly as written in the title (`dd/mm/yyyy`).
    pub end_text: String,
}

/// A table of cell strings.
///
/// Tables built by [`NormalizedTable::with_period`] start with the period
/// columns; raw sheet conversions hold the sheet's columns only.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct NormalizedTable {
    /// Column names.
    pub columns: Vec<String>,

    /// Data rows; every row has `columns.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// Build a table by prepending the period columns to `header` and each row.
    ///
    /// Rows shorter than the header are padded with empty cells and longer
    /// rows are truncated, so every row matches the column count.
    pub fn with_period(range: &DateRange, header: Vec<String>, body: Vec<Vec<String>>) -> Self {
        let width = header.len();
        let mut columns = Vec::with_capacity(width + 2);
        columns.push(PERIOD_START_COLUMN.to_string());
        columns.push(PERIOD_END_COLUMN.to_string());
        columns.extend(header);

        let rows = body
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, String::new());
                let mut row = Vec::with_capacity(width + 2);
                row.push(range.start_text.clone());
                row.push(range.end_text.clone());
                row.extend(cells);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, derived ones included.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Output of the normalizer for one spreadsheet.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NormalizedReport {
    /// Reporting period from the title cell.
    pub period: DateRange,

    /// The re-aligned table.
    pub table: NormalizedTable,

    /// Proposed output filename, e.g. `sales_20240101_20240107.csv`.
    pub filename: String,

    /// Raw title cell text, kept for diagnostics.
    pub title: String,

    /// Number of columns in the sheet's header row, before the period columns.
    pub source_columns: usize,
}
