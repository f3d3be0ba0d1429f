//! Core data model types: attachment payloads, normalized reports, and batch outcomes.

pub mod attachment;
pub mod outcome;
pub mod report;
