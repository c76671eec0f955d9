//! Message composition and content extraction helpers: RFC 2822 assembly
//! for outgoing mail, recipient list handling, and text extraction for
//! downloaded Drive files (HTML, JSON, PDF, and the Office formats).

use std::io::{Cursor, Read};

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use calamine::{Reader as WorkbookReader, open_workbook_auto_from_rs};
use htmd::HtmlToMarkdown;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;
use zip::ZipArchive;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Split a comma-separated recipient string into trimmed addresses.
/// Wrapping brackets like `<user@example.com>` or `[user@example.com]` are
/// stripped first. Empty segments are dropped.
pub fn split_recipients(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>'))
        .collect();
    cleaned
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split addresses into (valid, invalid) by the address validator.
pub fn partition_valid(addresses: Vec<String>) -> (Vec<String>, Vec<String>) {
    addresses
        .into_iter()
        .partition(|address| super::validate::is_valid_email(address))
}

/// Headers and body for an outgoing message.
#[derive(Debug, Default)]
pub struct OutgoingMessage {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub in_reply_to: Option<String>,
    pub body: String,
}

/// Assemble an RFC 2822 message and base64url-encode it for the Gmail
/// `raw` payload field.
pub fn encode_rfc2822(message: &OutgoingMessage) -> String {
    let mut lines = Vec::new();
    if let Some(from) = &message.from {
        lines.push(format!("From: {}", from));
    }
    if !message.to.is_empty() {
        lines.push(format!("To: {}", message.to.join(", ")));
    }
    if !message.cc.is_empty() {
        lines.push(format!("Cc: {}", message.cc.join(", ")));
    }
    if !message.bcc.is_empty() {
        lines.push(format!("Bcc: {}", message.bcc.join(", ")));
    }
    lines.push(format!("Subject: {}", message.subject));
    if let Some(in_reply_to) = &message.in_reply_to {
        lines.push(format!("In-Reply-To: {}", in_reply_to));
        lines.push(format!("References: {}", in_reply_to));
    }
    lines.push("MIME-Version: 1.0".to_string());
    lines.push("Content-Type: text/plain; charset=\"utf-8\"".to_string());
    lines.push(String::new());
    lines.push(message.body.clone());

    URL_SAFE.encode(lines.join("\r\n"))
}

/// Decode a Gmail base64url body chunk into text.
pub fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE.decode(data).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Apply add/remove edits to a recipient list, deduplicating while keeping
/// first-seen order. Existing entries pass through untouched — they came
/// from the message's own headers and may carry display names. Only the
/// edit lists are validated; invalid addresses in them are collected and
/// skipped. Removing an address that is not present is a no-op.
pub fn apply_recipient_edits(
    current: Vec<String>,
    add: &[String],
    remove: &[String],
    invalid: &mut Vec<String>,
) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for address in current {
        if !result.contains(&address) {
            result.push(address);
        }
    }
    for address in add {
        if !super::validate::is_valid_email(address) {
            if !invalid.contains(address) {
                invalid.push(address.clone());
            }
            continue;
        }
        if !result.contains(address) {
            result.push(address.clone());
        }
    }
    for address in remove {
        if !super::validate::is_valid_email(address) {
            if !invalid.contains(address) {
                invalid.push(address.clone());
            }
            continue;
        }
        result.retain(|existing| existing != address);
    }
    result
}

fn decode_utf8(bytes: &[u8]) -> String {
    // Tolerate a UTF-8 BOM from exported files.
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Pull the character data out of an OOXML part, inserting a line break at
/// each paragraph end (`w:p` in documents, `a:p` in slides).
fn xml_text(xml: &[u8]) -> anyhow::Result<String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(text) => out.push_str(&text.unescape()?),
            Event::End(end) if matches!(end.name().as_ref(), b"w:p" | b"a:p") => {
                out.push('\n');
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

fn extract_docx(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = Vec::new();
    archive
        .by_name("word/document.xml")
        .context("document archive has no word/document.xml part")?
        .read_to_end(&mut xml)?;
    xml_text(&xml)
}

fn extract_pptx(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    // slide10.xml must not sort before slide2.xml.
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    let mut slides = Vec::new();
    for name in &slide_names {
        let mut xml = Vec::new();
        archive.by_name(name)?.read_to_end(&mut xml)?;
        slides.push(xml_text(&xml)?);
    }
    Ok(slides.join("\n\n"))
}

fn extract_spreadsheet(bytes: &[u8]) -> anyhow::Result<String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();
    for (name, range) in workbook.worksheets() {
        let rows: Vec<String> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect();
        sheets.push(format!("{}\n{}", name, rows.join("\n")));
    }
    Ok(sheets.join("\n\n"))
}

/// Extract readable text from a downloaded file. HTML is converted to
/// markdown, JSON is pretty-printed, PDF and the Office formats go through
/// their parsers, everything else is decoded as UTF-8 with replacement.
pub fn extract_text(mime_type: &str, bytes: &[u8]) -> anyhow::Result<String> {
    match mime_type {
        "text/html" => {
            let converter = HtmlToMarkdown::builder()
                .skip_tags(vec!["script", "style", "head"])
                .build();
            let html = decode_utf8(bytes);
            Ok(converter.convert(&html).unwrap_or(html))
        }
        "application/json" => {
            let raw = decode_utf8(bytes);
            Ok(match serde_json::from_str::<Value>(&raw) {
                Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(raw),
                Err(_) => raw,
            })
        }
        "application/pdf" => Ok(pdf_extract::extract_text_from_mem(bytes)?),
        DOCX_MIME => extract_docx(bytes),
        PPTX_MIME => extract_pptx(bytes),
        XLSX_MIME | "application/vnd.ms-excel" => extract_spreadsheet(bytes),
        _ => Ok(decode_utf8(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn recipients_split_on_commas_and_lose_brackets() {
        assert_eq!(
            split_recipients("a@example.com, <b@example.com>,  c@example.com"),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
        assert_eq!(split_recipients(" , ,"), Vec::<String>::new());
    }

    #[test]
    fn partition_separates_invalid_addresses() {
        let (valid, invalid) = partition_valid(vec![
            "good@example.com".to_string(),
            "nope".to_string(),
            "also@example.com".to_string(),
        ]);
        assert_eq!(valid, vec!["good@example.com", "also@example.com"]);
        assert_eq!(invalid, vec!["nope"]);
    }

    #[test]
    fn rfc2822_encoding_round_trips() {
        let message = OutgoingMessage {
            from: None,
            to: vec!["a@example.com".to_string()],
            cc: vec!["b@example.com".to_string()],
            bcc: vec![],
            subject: "Re: Hello".to_string(),
            in_reply_to: Some("msg-9".to_string()),
            body: "Hi there".to_string(),
        };
        let decoded = decode_body(&encode_rfc2822(&message)).unwrap();
        assert!(decoded.contains("To: a@example.com\r\n"));
        assert!(decoded.contains("Cc: b@example.com\r\n"));
        assert!(!decoded.contains("Bcc:"));
        assert!(decoded.contains("Subject: Re: Hello\r\n"));
        assert!(decoded.contains("In-Reply-To: msg-9\r\n"));
        assert!(decoded.contains("References: msg-9\r\n"));
        assert!(decoded.ends_with("\r\n\r\nHi there"));
    }

    #[test]
    fn recipient_edits_dedupe_and_ignore_absent_removals() {
        let mut invalid = Vec::new();
        let result = apply_recipient_edits(
            vec!["a@example.com".to_string(), "b@example.com".to_string()],
            &[
                "b@example.com".to_string(),
                "c@example.com".to_string(),
                "broken".to_string(),
            ],
            &[
                "a@example.com".to_string(),
                "ghost@example.com".to_string(),
            ],
            &mut invalid,
        );
        assert_eq!(result, vec!["b@example.com", "c@example.com"]);
        assert_eq!(invalid, vec!["broken"]);
    }

    #[test]
    fn existing_recipients_pass_through_unvalidated() {
        let mut invalid = Vec::new();
        let current = split_recipients("John Doe <john@example.com>, jane@example.com");
        let result = apply_recipient_edits(current, &[], &[], &mut invalid);
        assert_eq!(result, vec!["John Doe john@example.com", "jane@example.com"]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn html_extracts_to_markdown() {
        let text = extract_text(
            "text/html",
            b"<html><head><style>x{}</style></head><body><h1>Title</h1><p>Body</p></body></html>",
        )
        .unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Body"));
        assert!(!text.contains("x{}"));
    }

    #[test]
    fn json_is_pretty_printed() {
        let text = extract_text("application/json", br#"{"a":1}"#).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
        // Malformed JSON falls back to the raw text.
        assert_eq!(
            extract_text("application/json", b"not json").unwrap(),
            "not json"
        );
    }

    #[test]
    fn plain_text_strips_a_bom() {
        assert_eq!(
            extract_text("text/plain", b"\xef\xbb\xbfhello").unwrap(),
            "hello"
        );
    }

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn docx_text_joins_paragraphs() {
        let doc = zip_with(&[(
            "word/document.xml",
            "<w:document><w:body>\
             <w:p><w:r><w:t>First line</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second line</w:t></w:r></w:p>\
             </w:body></w:document>",
        )]);
        let text = extract_text(DOCX_MIME, &doc).unwrap();
        assert_eq!(text, "First line\nSecond line");
    }

    #[test]
    fn pptx_slides_come_out_in_deck_order() {
        let deck = zip_with(&[
            (
                "ppt/slides/slide2.xml",
                "<p:sld><a:p><a:r><a:t>Second slide</a:t></a:r></a:p></p:sld>",
            ),
            (
                "ppt/slides/slide1.xml",
                "<p:sld><a:p><a:r><a:t>First slide</a:t></a:r></a:p></p:sld>",
            ),
            (
                "ppt/slides/slide10.xml",
                "<p:sld><a:p><a:r><a:t>Last slide</a:t></a:r></a:p></p:sld>",
            ),
        ]);
        let text = extract_text(PPTX_MIME, &deck).unwrap();
        assert_eq!(text, "First slide\n\nSecond slide\n\nLast slide");
    }
}
