//! RFC 2047 encoded-word decoding for attachment filenames.
//!
//! Unlike display headers, a filename that cannot be decoded is an error:
//! writing a payload under a half-decoded name is worse than skipping it.

use base64::Engine;
use tracing::debug;

use crate::error::{Result, SalesMailError};

/// `true` if the value contains an encoded-word opener followed by a terminator.
pub fn contains_encoded_word(value: &str) -> bool {
    value
        .find("=?")
        .is_some_and(|start| value[start + 2..].contains("?="))
}

/// Resolve an attachment filename.
///
/// Values holding encoded-words are decoded with their declared charset;
/// anything else is returned unchanged.
pub fn decode_filename(raw: &str) -> Result<String> {
    if !contains_encoded_word(raw) {
        return Ok(raw.to_string());
    }
    decode_encoded_words(raw).map_err(|reason| SalesMailError::FilenameDecode {
        filename: raw.to_string(),
        reason,
    })
}

/// Decode every encoded-word in `input`, failing on the first malformed one.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Whitespace between two adjacent encoded-words is dropped (RFC 2047 §6.2).
pub fn decode_encoded_words(input: &str) -> std::result::Result<String, String> {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let (text, consumed) = decode_one_word(&remaining[start + 2..])?;
        result.push_str(&text);
        remaining = &remaining[start + 2 + consumed..];
        last_was_encoded = true;
    }

    result.push_str(remaining);
    Ok(result)
}

/// Decode `charset?encoding?text?=` (the part after the leading `=?`).
///
/// Returns the text and the number of bytes consumed.
fn decode_one_word(s: &str) -> std::result::Result<(String, usize), String> {
    let first_q = s.find('?').ok_or("missing charset terminator")?;
    // RFC 2231 allows a language suffix: `utf-8*en`
    let charset = s[..first_q].split('*').next().unwrap_or("");
    if charset.is_empty() {
        return Err("empty charset".into());
    }

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?').ok_or("missing encoding terminator")?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=").ok_or("unterminated encoded-word")?;
    let encoded_text = &rest2[..end];

    let bytes = match encoding {
        "B" | "b" => base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(encoded_text.trim_end_matches('='))
            .map_err(|e| format!("invalid base64: {e}"))?,
        "Q" | "q" => decode_q_encoding(encoded_text)?,
        other => return Err(format!("unknown encoding '{other}'")),
    };

    let text = decode_charset(charset, &bytes)?;
    debug!(charset, encoding, decoded = %text, "Decoded encoded-word");

    Ok((text, first_q + 1 + second_q + 1 + end + 2))
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> std::result::Result<Vec<u8>, String> {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .ok_or("truncated =XX escape")?;
                if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(format!("bad escape '={hex}'"));
                }
                let byte =
                    u8::from_str_radix(hex, 16).map_err(|_| format!("bad escape '={hex}'"))?;
                result.push(byte);
                i += 3;
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    Ok(result)
}

/// Raw value of parameter `name` in a structured header such as
/// `attachment; filename="=?UTF-8?B?...?="`.
///
/// The value is unfolded and unquoted but otherwise left as sent, so
/// encoded-words can be decoded strictly afterwards. Extended (`name*`)
/// parameters are not matched.
pub fn raw_parameter(header_value: &str, name: &str) -> Option<String> {
    let unfolded = header_value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    split_parameters(&unfolded)
        .into_iter()
        .skip(1)
        .filter_map(|segment| segment.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| unquote(value.trim()))
}

/// Split on `;` outside of quoted strings.
fn split_parameters(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);
    segments
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    out.extend(chars.next());
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => value.to_string(),
    }
}

/// Decode bytes using a named charset, rejecting malformed input.
fn decode_charset(charset: &str, bytes: &[u8]) -> std::result::Result<String, String> {
    let encoding = encoding_rs::Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| format!("unknown charset '{charset}'"))?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
        .ok_or_else(|| format!("bytes are not valid {}", encoding.name()))
}
