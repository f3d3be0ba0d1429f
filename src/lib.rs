//! `salesmail`: turn sales report spreadsheets mailed as attachments into
//! clean CSV files.
//!
//! The pipeline has two core stages:
//! - [`parser`] reads `.eml` containers and yields spreadsheet attachments.
//! - [`report`] finds the reporting period in a sheet's title cell, re-aligns
//!   the table on its header row and proposes an output filename.
//!
//! [`export`] writes the results and [`batch`] drives whole directories.

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod report;

pub use error::{ErrorKind, Result, SalesMailError};
