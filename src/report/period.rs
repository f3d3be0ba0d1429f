//! Reporting period detection in the title cell.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Result, SalesMailError};
use crate::model::report::DateRange;

/// Day-first date format used in report titles.
pub const TITLE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date format used in generated filenames.
pub const FILENAME_DATE_FORMAT: &str = "%Y%m%d";

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})\s*-\s*(\d{2}/\d{2}/\d{4})").expect("valid date range regex")
});

/// Find the first `dd/mm/yyyy - dd/mm/yyyy` range in `title`.
///
/// Both dates must be real calendar dates; `32/01/2024` is an error, not
/// clamped. The start is not required to precede the end.
pub fn find_date_range(title: &str) -> Result<DateRange> {
    let caps = DATE_RANGE
        .captures(title)
        .ok_or_else(|| SalesMailError::DateRangeNotFound {
            cell: title.to_string(),
        })?;

    let start_text = caps[1].to_string();
    let end_text = caps[2].to_string();

    Ok(DateRange {
        start: parse_title_date(&start_text)?,
        end: parse_title_date(&end_text)?,
        start_text,
        end_text,
    })
}

fn parse_title_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, TITLE_DATE_FORMAT).map_err(|e| SalesMailError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Output filename for a period: `<prefix>_<yyyymmdd>_<yyyymmdd>.csv`.
pub fn output_filename(prefix: &str, range: &DateRange) -> String {
    format!(
        "{prefix}_{}_{}.csv",
        range.start.format(FILENAME_DATE_FORMAT),
        range.end.format(FILENAME_DATE_FORMAT)
    )
}
