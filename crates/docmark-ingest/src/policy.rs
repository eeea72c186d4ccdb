//! Supported file types: one declarative table consumed by validation.

use docmark_core::{Error, Result};

/// Document formats the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Html,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Html => "html",
        }
    }

    /// Guess the format from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }
        if bytes.starts_with(b"PK\x03\x04") {
            return Some(Self::Docx);
        }
        if bytes.starts_with(&OLE_MAGIC) {
            return Some(Self::Doc);
        }
        let head = &bytes[..bytes.len().min(512)];
        let trimmed = String::from_utf8_lossy(head);
        let trimmed = trimmed.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('<') {
            return Some(Self::Html);
        }
        None
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted extension and the MIME types a stored object may declare for it.
#[derive(Debug, Clone)]
pub struct SupportedType {
    pub extension: &'static str,
    pub format: DocumentFormat,
    pub mime_types: &'static [&'static str],
}

/// Extensions rejected with a dedicated, user-actionable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveOut {
    /// Google Docs placeholder that must be exported first.
    ExportRequired,
}

const PDF_MIME: &[&str] = &["application/pdf", "application/x-pdf"];
const DOCX_MIME: &[&str] = &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"];
const DOC_MIME: &[&str] = &["application/msword"];
const HTML_MIME: &[&str] = &["text/html", "application/xhtml+xml"];

/// Declared types that say nothing about the content.
const GENERIC_MIME: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Extension and MIME policy applied before and after fetching an object.
#[derive(Debug, Clone)]
pub struct TypePolicy {
    supported: Vec<SupportedType>,
    carve_outs: Vec<(&'static str, CarveOut)>,
    strict_mime: bool,
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl TypePolicy {
    pub fn new(allow_html: bool, strict_mime: bool) -> Self {
        let mut supported = vec![
            SupportedType { extension: "pdf", format: DocumentFormat::Pdf, mime_types: PDF_MIME },
            SupportedType { extension: "docx", format: DocumentFormat::Docx, mime_types: DOCX_MIME },
            SupportedType { extension: "doc", format: DocumentFormat::Doc, mime_types: DOC_MIME },
        ];
        if allow_html {
            supported.push(SupportedType { extension: "html", format: DocumentFormat::Html, mime_types: HTML_MIME });
            supported.push(SupportedType { extension: "htm", format: DocumentFormat::Html, mime_types: HTML_MIME });
        }

        Self {
            supported,
            carve_outs: vec![("document", CarveOut::ExportRequired)],
            strict_mime,
        }
    }

    /// Extensions accepted by this policy, with leading dot.
    pub fn extensions(&self) -> Vec<String> {
        self.supported.iter().map(|t| format!(".{}", t.extension)).collect()
    }

    /// Whether any accepted extension maps to `format`.
    pub fn allows(&self, format: DocumentFormat) -> bool {
        self.supported.iter().any(|t| t.format == format)
    }

    /// Resolve an object key to a document format by its extension.
    pub fn validate(&self, key: &str) -> Result<DocumentFormat> {
        let ext = extension_of(key)
            .ok_or_else(|| Error::UnsupportedType(format!("'{}' has no file extension", key)))?;

        if let Some((_, carve_out)) = self.carve_outs.iter().find(|(e, _)| *e == ext) {
            return match carve_out {
                CarveOut::ExportRequired => Err(Error::ExportRequired(key.to_string())),
            };
        }

        self.supported
            .iter()
            .find(|t| t.extension == ext)
            .map(|t| t.format)
            .ok_or_else(|| {
                Error::UnsupportedType(format!(
                    ".{} (supported: {})",
                    ext,
                    self.extensions().join(", ")
                ))
            })
    }

    /// Check the MIME type declared by the object store against the resolved format.
    pub fn check_content_type(&self, format: DocumentFormat, content_type: Option<&str>) -> Result<()> {
        let mime = match content_type.map(normalize_mime) {
            Some(m) if !m.is_empty() => m,
            _ => return Ok(()),
        };

        if mime.starts_with("image/") {
            return Err(Error::UnsupportedType(format!(
                "images are not supported (content type {})",
                mime
            )));
        }

        if !self.strict_mime || GENERIC_MIME.contains(&mime.as_str()) {
            return Ok(());
        }

        let allowed = self
            .supported
            .iter()
            .filter(|t| t.format == format)
            .any(|t| t.mime_types.contains(&mime.as_str()));
        if allowed {
            Ok(())
        } else {
            Err(Error::UnsupportedType(format!(
                "content type {} does not match .{} file",
                mime, format
            )))
        }
    }
}

/// Lowercased extension of the last path segment, without the dot.
pub fn extension_of(key: &str) -> Option<String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn normalize_mime(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}
