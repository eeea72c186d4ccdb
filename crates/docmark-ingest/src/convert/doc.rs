//! Legacy Word (`.doc`) text recovery.
//!
//! Files named `.doc` are frequently DOCX containers; those go through the
//! DOCX path. Real Word 97-2003 binaries are scanned for runs of readable
//! text (UTF-16LE or 8-bit), which recovers the body text without layout.

use docmark_core::{Error, Result};

use super::docx;

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Shortest run kept as text; shorter runs are mostly binary noise.
const MIN_RUN_CHARS: usize = 6;

/// Compound-file stream names that show up as UTF-16 text.
const STRUCTURAL_NAMES: &[&str] = &[
    "Root Entry",
    "WordDocument",
    "SummaryInformation",
    "DocumentSummaryInformation",
    "CompObj",
    "1Table",
    "0Table",
    "ObjectPool",
];

pub fn to_markdown(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(b"PK\x03\x04") {
        return docx::to_markdown(bytes);
    }
    if !bytes.starts_with(&OLE_MAGIC) {
        return Err(Error::Conversion("not a Word document (unknown container)".into()));
    }

    let wide = utf16_runs(bytes);
    let narrow = ascii_runs(bytes);
    let runs = if char_total(&wide) >= char_total(&narrow) { wide } else { narrow };

    let paragraphs: Vec<String> = runs
        .into_iter()
        .filter(|r| !STRUCTURAL_NAMES.contains(&r.trim()))
        .collect();
    if paragraphs.is_empty() {
        return Err(Error::Conversion("no readable text in Word document".into()));
    }
    Ok(paragraphs.join("\n\n"))
}

fn char_total(runs: &[String]) -> usize {
    runs.iter().map(|r| r.chars().count()).sum()
}

fn is_text_char(c: char) -> bool {
    let code = c as u32;
    c == ' '
        || c == '\t'
        || c.is_ascii_graphic()
        || ((0xA0..0x0800).contains(&code) && !c.is_control())
        || (0x2010..0x2030).contains(&code)
}

fn utf16_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]) as u32;
        match char::from_u32(unit) {
            // Word stores paragraph marks as CR.
            Some('\r') => push_run(&mut runs, &mut current),
            Some(c) if is_text_char(c) => current.push(c),
            _ => push_run(&mut runs, &mut current),
        }
    }
    push_run(&mut runs, &mut current);
    runs
}

fn ascii_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        match b {
            b'\r' => push_run(&mut runs, &mut current),
            b'\t' | 0x20..=0x7E => current.push(b as char),
            _ => push_run(&mut runs, &mut current),
        }
    }
    push_run(&mut runs, &mut current);
    runs
}

fn push_run(runs: &mut Vec<String>, current: &mut String) {
    let run = current.trim();
    let letters = run.chars().filter(|c| c.is_alphabetic()).count();
    if run.chars().count() >= MIN_RUN_CHARS && letters * 2 >= run.chars().count() {
        runs.push(run.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn fake_word_binary(text: &str) -> Vec<u8> {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 504]);
        bytes.extend(utf16("Root Entry"));
        bytes.extend_from_slice(&[0u8; 64]);
        bytes.extend(utf16(text));
        bytes.extend_from_slice(&[0u8, 0, 0xFF, 0xFF, 0x01, 0x00]);
        bytes
    }

    #[test]
    fn test_recovers_utf16_paragraphs() {
        let md = to_markdown(&fake_word_binary(
            "Quarterly report\rRevenue grew in every region.\r",
        ))
        .unwrap();
        assert_eq!(md, "Quarterly report\n\nRevenue grew in every region.");
    }

    #[test]
    fn test_docx_named_doc() {
        let docx = docx::tests::docx_with_body("<w:p><w:r><w:t>Renamed docx</w:t></w:r></w:p>");
        assert_eq!(to_markdown(&docx).unwrap(), "Renamed docx");
    }

    #[test]
    fn test_unknown_container() {
        assert!(matches!(to_markdown(b"%PDF-1.4"), Err(Error::Conversion(_))));
    }

    #[test]
    fn test_no_text() {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 512]);
        assert!(matches!(to_markdown(&bytes), Err(Error::Conversion(_))));
    }
}
