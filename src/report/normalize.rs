//! Re-align a title-annotated sales sheet into a clean table.
//!
//! The expected layout is:
//! - row 1: report title holding `dd/mm/yyyy - dd/mm/yyyy`
//! - row 2: company details (ignored)
//! - row 3: column headers
//! - row 4+: data rows
//!
//! All positions are configurable through [`ReportOptions`].

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader};
use chrono::NaiveTime;
use tracing::debug;

use crate::error::{Result, SalesMailError};
use crate::model::report::{NormalizedReport, NormalizedTable};
use crate::report::period;

/// Where to find the pieces of a report. Rows and columns are zero-based.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Worksheet to read (0 = first sheet).
    pub sheet_index: usize,
    /// `(row, column)` of the title cell.
    pub title_cell: (u32, u32),
    /// Row holding the column names; data starts on the next row.
    pub header_row: u32,
    /// Drop every data row in which all cells are empty. When `false`, only
    /// trailing blank rows are trimmed.
    pub skip_blank_rows: bool,
    /// Prefix of the proposed output filename.
    pub filename_prefix: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            title_cell: (0, 0),
            header_row: 2,
            skip_blank_rows: false,
            filename_prefix: "sales".to_string(),
        }
    }
}

/// Normalize a spreadsheet held in memory.
pub fn normalize(spreadsheet: &[u8], options: &ReportOptions) -> Result<NormalizedReport> {
    let sheet = read_sheet(spreadsheet, options.sheet_index)?;
    normalize_range(&sheet, options)
}

/// Normalize a spreadsheet file.
pub fn normalize_file(path: impl AsRef<Path>, options: &ReportOptions) -> Result<NormalizedReport> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SalesMailError::FileNotFound(path.to_path_buf())
        } else {
            SalesMailError::io(path, e)
        }
    })?;
    normalize(&data, options)
}

/// Open a workbook (format sniffed from the bytes) and load one worksheet.
pub fn read_sheet(spreadsheet: &[u8], sheet_index: usize) -> Result<Range<Data>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(spreadsheet.to_vec()))?;
    let names = workbook.sheet_names();
    debug!(sheets = ?names, sheet_index, "Opened workbook");

    workbook
        .worksheet_range_at(sheet_index)
        .ok_or_else(|| {
            SalesMailError::Spreadsheet(format!(
                "no worksheet at index {sheet_index} ({} sheet(s) present)",
                names.len()
            ))
        })?
        .map_err(SalesMailError::from)
}

/// Read one worksheet as it is: its first used row becomes the header and
/// every row below is data. No title or period handling.
pub fn sheet_to_table(spreadsheet: &[u8], sheet_index: usize) -> Result<NormalizedTable> {
    let sheet = read_sheet(spreadsheet, sheet_index)?;
    Ok(range_to_table(&sheet))
}

/// Table view of a loaded worksheet, see [`sheet_to_table`].
pub fn range_to_table(sheet: &Range<Data>) -> NormalizedTable {
    let Some((first_row, _)) = sheet.start() else {
        return NormalizedTable::default();
    };
    let (columns, mut rows) = slice_table(sheet, first_row, false);
    let width = columns.len();
    for row in &mut rows {
        row.resize(width, String::new());
    }
    NormalizedTable { columns, rows }
}

/// Normalize an already loaded worksheet.
pub fn normalize_range(sheet: &Range<Data>, options: &ReportOptions) -> Result<NormalizedReport> {
    let title = cell_text(sheet, options.title_cell);
    debug!(title = %title, "Title cell");

    let range = period::find_date_range(&title)?;
    debug!(start = %range.start_text, end = %range.end_text, "Found dates");

    let (header, body) = slice_table(sheet, options.header_row, options.skip_blank_rows);
    debug!(
        rows = body.len(),
        columns = header.len(),
        "Original table shape"
    );

    let source_columns = header.len();
    let table = NormalizedTable::with_period(&range, header, body);
    let filename = period::output_filename(&options.filename_prefix, &range);

    Ok(NormalizedReport {
        period: range,
        table,
        filename,
        title,
        source_columns,
    })
}

/// Split the sheet into the header row and the data rows below it.
///
/// Columns always start at the first sheet column so positions match what a
/// user sees in a spreadsheet application.
fn slice_table(
    sheet: &Range<Data>,
    header_row: u32,
    skip_blank_rows: bool,
) -> (Vec<String>, Vec<Vec<String>>) {
    let Some((last_row, last_col)) = sheet.end() else {
        return (Vec::new(), Vec::new());
    };
    if header_row > last_row {
        return (Vec::new(), Vec::new());
    }

    let read_row = |row: u32| -> Vec<String> {
        (0..=last_col).map(|col| cell_text(sheet, (row, col))).collect()
    };

    let header = read_row(header_row);
    let mut body: Vec<Vec<String>> = (header_row + 1..=last_row).map(read_row).collect();
    if skip_blank_rows {
        body.retain(|cells| !is_blank(cells));
    } else {
        while body.last().is_some_and(|cells| is_blank(cells)) {
            body.pop();
        }
    }

    (header, body)
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(String::is_empty)
}

/// Stringified value at an absolute position; empty when outside the used range.
fn cell_text(sheet: &Range<Data>, position: (u32, u32)) -> String {
    sheet.get_value(position).map(cell_to_string).unwrap_or_default()
}

/// Render a cell the way it should appear in CSV output.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(e) => e.to_string(),
    }
}
