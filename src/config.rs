//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$SALESMAIL_CONFIG` (environment variable)
//! 2. `~/.config/salesmail/config.toml` (Linux/macOS)
//!    `%APPDATA%\salesmail\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The library never reads this on its own: the CLI loads it and converts the
//! sections into the option structs the pipeline takes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::export::csv::CsvOptions;
use crate::parser::mime::ExtractOptions;
use crate::report::normalize::ReportOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Input, output and staging locations.
    pub paths: PathsConfig,
    /// Attachment selection.
    pub extract: ExtractConfig,
    /// Report layout.
    pub report: ReportConfig,
    /// CSV output.
    pub export: ExportConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Input, output and staging locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for `.eml` files.
    pub input_dir: PathBuf,
    /// Directory receiving the generated CSV files.
    pub output_dir: PathBuf,
    /// Root for per-message staging directories (system temp dir when unset).
    pub staging_dir: Option<PathBuf>,
}

/// Attachment selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Filename suffixes accepted as spreadsheets.
    pub extensions: Vec<String>,
    /// Compare suffixes ignoring ASCII case.
    pub case_insensitive: bool,
}

/// Report layout. Rows and columns are zero-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Worksheet to read (0 = first sheet).
    pub sheet_index: usize,
    /// Row of the title cell holding the date range.
    pub title_row: u32,
    /// Column of the title cell holding the date range.
    pub title_column: u32,
    /// Row holding the column names.
    pub header_row: u32,
    /// Drop every blank data row, not only trailing ones.
    pub skip_blank_rows: bool,
    /// Prefix of generated filenames (`<prefix>_<start>_<end>.csv`).
    pub filename_prefix: String,
}

/// CSV output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// CSV field separator character.
    pub delimiter: char,
    /// Prefix the file with a UTF-8 BOM (for Excel).
    pub write_bom: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("eml"),
            output_dir: PathBuf::from("csv"),
            staging_dir: None,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let defaults = ExtractOptions::default();
        Self {
            extensions: defaults.extensions,
            case_insensitive: defaults.case_insensitive,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let defaults = ReportOptions::default();
        Self {
            sheet_index: defaults.sheet_index,
            title_row: defaults.title_cell.0,
            title_column: defaults.title_cell.1,
            header_row: defaults.header_row,
            skip_blank_rows: defaults.skip_blank_rows,
            filename_prefix: defaults.filename_prefix,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            write_bom: false,
        }
    }
}

// ── Conversion into pipeline options ────────────────────────────

impl Config {
    /// Attachment selection options.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            extensions: self.extract.extensions.clone(),
            case_insensitive: self.extract.case_insensitive,
        }
    }

    /// Report layout options.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            sheet_index: self.report.sheet_index,
            title_cell: (self.report.title_row, self.report.title_column),
            header_row: self.report.header_row,
            skip_blank_rows: self.report.skip_blank_rows,
            filename_prefix: self.report.filename_prefix.clone(),
        }
    }

    /// CSV output options.
    ///
    /// Non-ASCII delimiters cannot be expressed as a single byte and fall back to `,`.
    pub fn csv_options(&self) -> CsvOptions {
        let delimiter = if self.export.delimiter.is_ascii() {
            self.export.delimiter as u8
        } else {
            tracing::warn!(
                delimiter = %self.export.delimiter,
                "Non-ASCII CSV delimiter, using ','"
            );
            b','
        };
        CsvOptions {
            delimiter,
            write_bom: self.export.write_bom,
        }
    }

    /// Full batch options from the configured paths.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            input_dir: self.paths.input_dir.clone(),
            output_dir: self.paths.output_dir.clone(),
            staging_dir: self.paths.staging_dir.clone(),
            extract: self.extract_options(),
            report: self.report_options(),
            csv: self.csv_options(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration from an explicit file, or search standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config(explicit: Option<&std::path::Path>) -> Config {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => config_file_path(),
    };
    if let Some(path) = path {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to `path`, or to the standard location when `None`.
pub fn save_config(config: &Config, path: Option<&std::path::Path>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SALESMAIL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("salesmail").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("salesmail")
}
