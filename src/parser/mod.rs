//! Email parsing: `.eml` reading, MIME walking, and filename decoding.

pub mod eml;
pub mod header;
pub mod mime;
