//! PDF text extraction via `pdf-extract`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use docmark_core::{Error, Result};

pub fn to_markdown(bytes: &[u8]) -> Result<String> {
    if !bytes.starts_with(b"%PDF") {
        return Err(Error::Conversion("not a PDF file (missing %PDF header)".into()));
    }

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let extracted = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| Error::Conversion("PDF parser aborted on malformed input".into()))?;

    let text = extracted
        .map_err(|e| Error::Conversion(format!("failed to extract text from PDF: {}", e)))?;

    // Form feeds mark page breaks.
    Ok(text.replace('\u{c}', "\n\n"))
}
