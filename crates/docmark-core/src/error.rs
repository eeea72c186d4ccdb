//! Error types for docmark.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Unexported Google Docs placeholder (`.document`). The caller has to
    /// export the file before uploading it again.
    #[error(
        "'{0}' is a Google Docs shortcut, not a document. \
         Export it as .pdf or .docx (File > Download) and upload that file instead"
    )]
    ExportRequired(String),

    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Access denied: {0}")]
    Access(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP-style status reported to direct-mode callers.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_)
            | Self::UnsupportedType(_)
            | Self::ExportRequired(_)
            | Self::Json(_) => 400,
            Self::Access(_) => 403,
            Self::ObjectNotFound { .. } => 404,
            Self::Conversion(_)
            | Self::Persistence(_)
            | Self::Configuration(_)
            | Self::Notification(_)
            | Self::Io(_) => 500,
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::ExportRequired(_) => "export_required",
            Self::ObjectNotFound { .. } => "object_not_found",
            Self::Access(_) => "access_denied",
            Self::Conversion(_) => "conversion_failed",
            Self::Persistence(_) => "persistence_failed",
            Self::Configuration(_) => "configuration",
            Self::Notification(_) => "notification_failed",
            Self::Io(_) => "io",
            Self::Json(_) => "bad_request",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_client_errors() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::UnsupportedType(".exe".into()).status_code(), 400);
        assert_eq!(Error::ExportRequired("a.document".into()).status_code(), 400);
    }

    #[test]
    fn test_backend_errors_are_server_errors() {
        assert_eq!(Error::Conversion("bad".into()).status_code(), 500);
        assert_eq!(Error::Persistence("bad".into()).status_code(), 500);
        assert_eq!(Error::Notification("bad".into()).status_code(), 500);
        assert_eq!(Error::Configuration("bad".into()).status_code(), 500);
    }

    #[test]
    fn test_export_required_message_guides_user() {
        let msg = Error::ExportRequired("h2/file.document".into()).to_string();
        assert!(msg.contains("h2/file.document"));
        assert!(msg.contains(".pdf"));
        assert!(msg.contains(".docx"));
    }

    #[test]
    fn test_codes_distinguish_carve_out() {
        assert_ne!(
            Error::ExportRequired("a".into()).code(),
            Error::UnsupportedType("a".into()).code()
        );
    }
}
