//! MIME walking: find spreadsheet attachments in a parsed message.

use mail_parser::{HeaderName, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

use crate::error::{Result, SalesMailError};
use crate::model::attachment::{AttachmentPayload, Extraction, SkippedPart};
use crate::parser::header;

/// Maximum depth for descending into embedded `message/rfc822` parts
/// (to prevent stack overflow on adversarial input).
const MAX_DEPTH: usize = 10;

/// Which attachments count as spreadsheets.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Accepted filename suffixes, including the dot.
    pub extensions: Vec<String>,
    /// Compare suffixes ignoring ASCII case.
    pub case_insensitive: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extensions: vec![".xlsx".to_string(), ".xls".to_string()],
            case_insensitive: false,
        }
    }
}

impl ExtractOptions {
    /// `true` if `filename` ends with one of the accepted suffixes.
    pub fn accepts(&self, filename: &str) -> bool {
        self.extensions.iter().any(|ext| {
            if self.case_insensitive {
                filename.len() >= ext.len()
                    && filename.is_char_boundary(filename.len() - ext.len())
                    && filename[filename.len() - ext.len()..].eq_ignore_ascii_case(ext)
            } else {
                filename.ends_with(ext.as_str())
            }
        })
    }
}

/// Parse a raw email container and collect its spreadsheet attachments.
///
/// Every part is visited in document order, including parts of embedded
/// messages. A part is a candidate when its disposition is `attachment` and
/// it carries a non-empty filename; candidates whose filename cannot be
/// decoded are reported in [`Extraction::skipped`].
pub fn extract_spreadsheets(raw_message: &[u8], options: &ExtractOptions) -> Result<Extraction> {
    let message_bytes = skip_from_line(raw_message);
    if message_bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(SalesMailError::Parse("empty message".into()));
    }

    let msg = MessageParser::default()
        .parse(message_bytes)
        .ok_or_else(|| SalesMailError::Parse("mail-parser could not read the message".into()))?;

    if msg.parts.first().map_or(true, |root| root.headers.is_empty()) {
        return Err(SalesMailError::Parse("message has no header fields".into()));
    }

    let mut extraction = Extraction::default();
    walk_message(&msg, options, 0, &mut extraction);

    debug!(
        payloads = extraction.payloads.len(),
        skipped = extraction.skipped.len(),
        "Extraction finished"
    );
    Ok(extraction)
}

/// Visit every part of `msg`, descending into embedded messages.
fn walk_message(
    msg: &Message<'_>,
    options: &ExtractOptions,
    depth: usize,
    out: &mut Extraction,
) {
    for part in &msg.parts {
        visit_part(part, &msg.raw_message, options, out);

        if let PartType::Message(inner) = &part.body {
            if depth + 1 >= MAX_DEPTH {
                warn!(depth, "Embedded message nesting too deep, not descending");
            } else {
                walk_message(inner, options, depth + 1, out);
            }
        }
    }
}

/// Apply the attachment rules to a single part.
///
/// `raw` is the message text the part's header offsets point into.
fn visit_part(part: &MessagePart<'_>, raw: &[u8], options: &ExtractOptions, out: &mut Extraction) {
    let is_attachment = part
        .content_disposition()
        .map(|d| d.ctype().eq_ignore_ascii_case("attachment"))
        .unwrap_or(false);
    if !is_attachment {
        return;
    }

    // mail-parser decodes encoded-words leniently, so those are decoded
    // again from the header text as sent.
    let encoded = raw_filename(part, raw).filter(|name| header::contains_encoded_word(name));
    let filename = match encoded {
        Some(encoded) => match header::decode_filename(&encoded) {
            Ok(name) => name,
            Err(e) => {
                warn!(filename = %encoded, error = %e, "Skipping attachment");
                out.skipped.push(SkippedPart {
                    raw_filename: encoded,
                    reason: e.to_string(),
                });
                return;
            }
        },
        None => match part.attachment_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!("Attachment without filename, ignoring");
                return;
            }
        },
    };

    if !options.accepts(&filename) {
        debug!(filename = %filename, "Not a spreadsheet, ignoring");
        return;
    }

    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{sub}", ct.ctype()),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    debug!(filename = %filename, size = part.contents().len(), "Found spreadsheet");
    out.payloads.push(AttachmentPayload {
        filename,
        content_type,
        data: part.contents().to_vec(),
    });
}

/// The filename parameter exactly as it appears in the part headers:
/// disposition `filename`, falling back to content-type `name`.
fn raw_filename(part: &MessagePart<'_>, raw: &[u8]) -> Option<String> {
    let header_text = |wanted: fn(&HeaderName<'_>) -> bool| {
        part.headers
            .iter()
            .find(|h| wanted(&h.name))
            .and_then(|h| raw.get(h.offset_start..h.offset_end))
            .map(String::from_utf8_lossy)
    };

    header_text(|name| matches!(name, HeaderName::ContentDisposition))
        .and_then(|value| header::raw_parameter(&value, "filename"))
        .or_else(|| {
            header_text(|name| matches!(name, HeaderName::ContentType))
                .and_then(|value| header::raw_parameter(&value, "name"))
        })
}

/// Skip a UTF-8 BOM and the `From ` separator line of MBOX-exported messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}
