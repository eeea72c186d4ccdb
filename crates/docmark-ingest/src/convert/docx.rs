//! DOCX → Markdown: reads `word/document.xml` out of the OOXML zip container.
//!
//! Paragraph styles `Title` / `HeadingN` become `#` headings, numbered or
//! bulleted paragraphs become `-` list items, everything else is a paragraph.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use docmark_core::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph kinds recognised from `w:pPr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Heading(usize),
    ListItem,
    Paragraph,
}

#[derive(Debug)]
struct Paragraph {
    kind: Block,
    text: String,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self {
            kind: Block::Paragraph,
            text: String::new(),
        }
    }
}

pub fn to_markdown(bytes: &[u8]) -> Result<String> {
    let xml = read_document_part(bytes)?;
    let paragraphs = parse_paragraphs(&xml)?;

    // List items stay on consecutive lines, other blocks are separated by a blank line.
    let mut out = String::new();
    let mut prev: Option<Block> = None;
    for para in paragraphs {
        if para.text.trim().is_empty() {
            continue;
        }
        let line = match para.kind {
            Block::Heading(level) => format!("{} {}", "#".repeat(level), para.text.trim()),
            Block::ListItem => format!("- {}", para.text.trim()),
            Block::Paragraph => para.text.trim_end().to_string(),
        };
        if let Some(p) = prev {
            let tight = p == Block::ListItem && para.kind == Block::ListItem;
            out.push_str(if tight { "\n" } else { "\n\n" });
        }
        out.push_str(&line);
        prev = Some(para.kind);
    }
    Ok(out)
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Conversion(format!("not a DOCX archive: {}", e)))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| Error::Conversion(format!("DOCX archive has no {}", DOCUMENT_PART)))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| Error::Conversion(format!("unreadable {}: {}", DOCUMENT_PART, e)))?;
    Ok(xml)
}

/// Walk `w:p` / `w:r` / `w:t` events. Tabs and breaks count only inside a run,
/// so tab-stop definitions under `w:pPr` never reach the text.
fn parse_paragraphs(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current = Paragraph::default();
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current = Paragraph::default();
                }
                b"r" => in_run = in_paragraph,
                b"t" => in_text = in_run,
                _ if in_paragraph => apply_property(e, &mut current),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" if in_run => current.text.push('\t'),
                b"br" | b"cr" if in_run => current.text.push('\n'),
                _ if in_paragraph => apply_property(e, &mut current),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Conversion(format!("bad text in {}: {}", DOCUMENT_PART, e)))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Conversion(format!(
                    "XML error in {} at {}: {}",
                    DOCUMENT_PART,
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

/// Heading and list markers from paragraph properties.
fn apply_property(e: &BytesStart, para: &mut Paragraph) {
    match e.local_name().as_ref() {
        b"pStyle" => {
            let Some(style) = attribute(e, b"val") else {
                return;
            };
            let style = style.to_ascii_lowercase();
            if style == "title" {
                para.kind = Block::Heading(1);
            } else if let Some(level) = style.strip_prefix("heading") {
                let level: usize = level.trim().parse().unwrap_or(1);
                para.kind = Block::Heading(level.clamp(1, 6));
            } else if style.starts_with("listparagraph") || style.starts_with("listbullet") {
                para.kind = Block::ListItem;
            }
        }
        b"numPr" => {
            if para.kind == Block::Paragraph {
                para.kind = Block::ListItem;
            }
        }
        _ => {}
    }
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}
