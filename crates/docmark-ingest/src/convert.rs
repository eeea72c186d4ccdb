//! Document → Markdown conversion.
//!
//! The worker only sees the `DocumentConverter` trait. `MarkdownConverter`
//! dispatches to a per-format backend; each backend is a thin wrapper over
//! the library that does the actual parsing.

pub mod doc;
pub mod docx;
pub mod html;
pub mod pdf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::policy::DocumentFormat;
use docmark_core::Result;

/// Trait for conversion backends.
pub trait DocumentConverter: Send + Sync {
    /// Convert raw document bytes to UTF-8 Markdown.
    ///
    /// Fails with `Error::Conversion` for malformed or unreadable input.
    fn convert(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String>;
}

/// Default converter covering every format in the type policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for MarkdownConverter {
    fn convert(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
        let raw = match format {
            DocumentFormat::Pdf => pdf::to_markdown(bytes)?,
            DocumentFormat::Docx => docx::to_markdown(bytes)?,
            DocumentFormat::Doc => doc::to_markdown(bytes)?,
            DocumentFormat::Html => html::to_markdown(bytes)?,
        };
        Ok(tidy(&raw))
    }
}

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip trailing whitespace, collapse runs of blank lines, trim the ends.
pub fn tidy(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
    let joined = trimmed.join("\n");
    BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}
