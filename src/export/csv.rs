//! Write normalized reports as CSV.
//!
//! Output is UTF-8 with a header row and no index column. A BOM can be
//! requested for Excel compatibility.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SalesMailError};
use crate::export::reserve_unique_file;
use crate::model::report::{NormalizedReport, NormalizedTable};

/// CSV dialect options.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator byte.
    pub delimiter: u8,
    /// Prefix the output with a UTF-8 BOM.
    pub write_bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            write_bom: false,
        }
    }
}

/// Serialize `table` to `writer`: header row first, then every data row.
pub fn write_table<W: Write>(table: &NormalizedTable, mut writer: W, options: &CsvOptions) -> Result<()> {
    if options.write_bom {
        writer
            .write_all(&[0xEF, 0xBB, 0xBF])
            .map_err(|e| SalesMailError::Csv(e.to_string()))?;
    }

    let mut csv = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    csv.write_record(&table.columns)?;
    for row in &table.rows {
        csv.write_record(row)?;
    }
    csv.flush().map_err(|e| SalesMailError::Csv(e.to_string()))?;
    Ok(())
}

/// Write a report into `output_dir` under its proposed filename.
///
/// If that name is taken, `_1`, `_2`, … is appended before the extension.
/// Existing files are never overwritten. Returns the path written.
pub fn save_report(report: &NormalizedReport, output_dir: &Path, options: &CsvOptions) -> Result<PathBuf> {
    save_table(&report.table, output_dir, &report.filename, options)
}

/// Write `table` as `output_dir/filename`, disambiguated like [`save_report`].
///
/// On failure the partially written file is removed.
pub fn save_table(
    table: &NormalizedTable,
    output_dir: &Path,
    filename: &str,
    options: &CsvOptions,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| SalesMailError::io(output_dir, e))?;

    let (path, file) = reserve_unique_file(&output_dir.join(filename))?;
    let written = write_table(table, &file, options).and_then(|()| sync(&file, &path));
    if let Err(e) = written {
        drop(file);
        let _ = std::fs::remove_file(&path);
        return Err(e);
    }

    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Saved CSV"
    );
    Ok(path)
}

/// CSV filename for a raw sheet conversion: the source stem plus `.csv`.
pub fn raw_csv_filename(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "sheet".to_string());
    format!("{stem}.csv")
}

fn sync(file: &File, path: &Path) -> Result<()> {
    file.sync_all().map_err(|e| SalesMailError::io(path, e))
}

/// Read a CSV file back into header and rows, as plain strings.
pub fn read_table(path: &Path, options: &CsvOptions) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let data = std::fs::read(path).map_err(|e| SalesMailError::io(path, e))?;
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&data);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .from_reader(data);
    let header = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(String::from).collect());
    }
    Ok((header, rows))
}
