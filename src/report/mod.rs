//! Sales report normalization: period detection and table re-alignment.

pub mod normalize;
pub mod period;

pub use normalize::{normalize, normalize_file, ReportOptions};
