//! Fixture builders shared by the integration tests.
//!
//! Workbooks are produced as minimal OOXML packages and messages as literal
//! MIME text, so no binary fixtures need to be checked in.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::Engine;

/// One worksheet cell.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

/// The usual report layout: title, company line, header, then data rows.
pub fn sales_rows<'a>(title: &'a str, data_rows: usize) -> Vec<Vec<Cell<'a>>> {
    let mut rows = vec![
        vec![Cell::Text(title)],
        vec![Cell::Text("ACME Retail Ltd - Supplier 4711")],
        vec![Cell::Text("Store"), Cell::Text("SKU"), Cell::Text("Units"), Cell::Text("Net Sales")],
    ];
    for i in 0..data_rows {
        rows.push(vec![
            Cell::Text(if i % 2 == 0 { "North" } else { "South, East" }),
            Cell::Text("A-100"),
            Cell::Number(i as f64 + 1.0),
            Cell::Number(12.5 * (i as f64 + 1.0)),
        ]);
    }
    rows
}

fn column_name(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sheet_xml(rows: &[Vec<Cell<'_>>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), r + 1);
            match cell {
                Cell::Text(text) => xml.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    xml_escape(text)
                )),
                Cell::Number(n) => xml.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#)),
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Build an `.xlsx` workbook whose sheets hold the given rows.
pub fn build_xlsx(sheets: &[Vec<Vec<Cell<'_>>>]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();

    let mut overrides = String::new();
    let mut sheet_entries = String::new();
    let mut rels = String::new();
    for i in 1..=sheets.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        sheet_entries.push_str(&format!(
            r#"<sheet name="Sheet{i}" sheetId="{i}" r:id="rId{i}"/>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }

    let files = [
        (
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
            ),
        ),
        (
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
    ];

    for (name, contents) in files {
        zip.start_file(name, options).expect("start zip entry");
        zip.write_all(contents.as_bytes()).expect("write zip entry");
    }
    for (i, rows) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
            .expect("start sheet entry");
        zip.write_all(sheet_xml(rows).as_bytes())
            .expect("write sheet entry");
    }

    zip.finish().expect("finish zip").into_inner()
}

/// A standard single-sheet sales workbook.
pub fn sales_xlsx(title: &str, data_rows: usize) -> Vec<u8> {
    build_xlsx(&[sales_rows(title, data_rows)])
}

/// One MIME part of a test message.
pub struct Part<'a> {
    pub content_type: &'a str,
    pub disposition: Option<&'a str>,
    /// Value placed verbatim inside `filename="…"`.
    pub filename: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn attachment(filename: &'a str, data: &'a [u8]) -> Self {
        Self {
            content_type: "application/octet-stream",
            disposition: Some("attachment"),
            filename: Some(filename),
            data,
        }
    }
}

const BOUNDARY: &str = "=_salesmail_test_boundary";

fn wrap_base64(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    encoded
        .as_bytes()
        .chunks(76)
        .map(|c| std::str::from_utf8(c).expect("base64 is ASCII"))
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn render_part(part: &Part<'_>) -> String {
    let mut out = format!("Content-Type: {}\r\n", part.content_type);
    if let Some(disposition) = part.disposition {
        match part.filename {
            Some(name) => out.push_str(&format!(
                "Content-Disposition: {disposition}; filename=\"{name}\"\r\n"
            )),
            None => out.push_str(&format!("Content-Disposition: {disposition}\r\n")),
        }
    }
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrap_base64(part.data));
    out.push_str("\r\n");
    out
}

/// Build a `multipart/mixed` message with a text body and the given parts.
pub fn build_eml(subject: &str, parts: &[Part<'_>]) -> Vec<u8> {
    let mut msg = format!(
        "From: Sales Desk <reports@supplier.example>\r\n\
         To: ops@retailer.example\r\n\
         Subject: {subject}\r\n\
         Date: Mon, 08 Jan 2024 09:00:00 +0000\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"{BOUNDARY}\"\r\n\r\n\
         --{BOUNDARY}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\r\n\
         Please find this week's report attached.\r\n"
    );
    for part in parts {
        msg.push_str(&format!("--{BOUNDARY}\r\n"));
        msg.push_str(&render_part(part));
    }
    msg.push_str(&format!("--{BOUNDARY}--\r\n"));
    msg.into_bytes()
}

/// Build a message whose only attachment is another message (`message/rfc822`).
pub fn build_forwarded_eml(inner: &[u8]) -> Vec<u8> {
    let inner = String::from_utf8_lossy(inner);
    format!(
        "From: forwarder@retailer.example\r\n\
         To: ops@retailer.example\r\n\
         Subject: Fwd: weekly report\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"outer-boundary\"\r\n\r\n\
         --outer-boundary\r\n\
         Content-Type: text/plain\r\n\r\n\
         Forwarding.\r\n\
         --outer-boundary\r\n\
         Content-Type: message/rfc822\r\n\
         Content-Disposition: inline\r\n\r\n\
         {inner}\r\n\
         --outer-boundary--\r\n"
    )
    .into_bytes()
}

/// Write `data` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write fixture");
    path
}
