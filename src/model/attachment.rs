//! Attachment payloads pulled out of an email container.
//!
//! Unlike a lazily decoded listing, a payload owns its decoded bytes: the
//! whole attachment is held in memory until it is normalized or staged.

/// A spreadsheet attachment with its resolved filename.
#[derive(Debug, Clone)]
pub struct AttachmentPayload {
    /// Filename after RFC 2047 encoded-word decoding.
    pub filename: String,

    /// MIME content type (e.g. `"application/vnd.ms-excel"`).
    pub content_type: String,

    /// Decoded attachment bytes (transfer encoding already removed).
    pub data: Vec<u8>,
}

impl AttachmentPayload {
    /// Decoded size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// An attachment part that was skipped because its filename could not be decoded.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SkippedPart {
    /// The filename exactly as it appeared in the headers.
    pub raw_filename: String,

    /// Why decoding failed.
    pub reason: String,
}

/// Result of extracting spreadsheets from one container.
///
/// An empty `payloads` list is a normal outcome, distinct from a parse failure.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Spreadsheet attachments in document order.
    pub payloads: Vec<AttachmentPayload>,

    /// Attachment parts dropped because of undecodable filenames.
    pub skipped: Vec<SkippedPart>,
}

impl Extraction {
    /// `true` when no spreadsheet was found.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}
