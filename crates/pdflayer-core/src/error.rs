//! Error and warning types for pdflayer.
//!
//! Provides [`PdfError`] for fatal errors that stop a request and
//! [`ExtractWarning`] for non-fatal issues that were absorbed by
//! skipping an item, an entry or a whole strategy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fatal error types for document extraction.
///
/// Only conditions that prevent any result from being produced are
/// reported this way. Everything else becomes an [`ExtractWarning`].
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// The uploaded file is not a PDF.
    InvalidFileType(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::InvalidFileType(name) => write!(
                f,
                "Invalid file type. Only PDF files are allowed. (got {name})"
            ),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Machine-readable warning code for categorizing absorbed failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractWarningCode {
    /// A manifest entry was missing required fields and was dropped.
    MalformedManifestEntry,
    /// A manifest page has no counterpart in the document.
    ManifestPageOutOfRange,
    /// An embedded file named like a manifest could not be read or parsed.
    ManifestUnreadable,
    /// An image uses an encoding that cannot be re-wrapped.
    UnsupportedImageEncoding,
    /// Image bytes could not be read or re-encoded.
    ImageDecodeFailed,
    /// A page content stream could not be interpreted.
    PageInterpretationFailed,
    /// Paint order could not be reconstructed for a page.
    PaintOrderUnavailable,
    /// The legacy rasterizer did not produce output.
    RasterizerUnavailable,
    /// A page has a zero or negative width or height.
    DegeneratePage,
}

impl ExtractWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractWarningCode::MalformedManifestEntry => "MALFORMED_MANIFEST_ENTRY",
            ExtractWarningCode::ManifestPageOutOfRange => "MANIFEST_PAGE_OUT_OF_RANGE",
            ExtractWarningCode::ManifestUnreadable => "MANIFEST_UNREADABLE",
            ExtractWarningCode::UnsupportedImageEncoding => "UNSUPPORTED_IMAGE_ENCODING",
            ExtractWarningCode::ImageDecodeFailed => "IMAGE_DECODE_FAILED",
            ExtractWarningCode::PageInterpretationFailed => "PAGE_INTERPRETATION_FAILED",
            ExtractWarningCode::PaintOrderUnavailable => "PAINT_ORDER_UNAVAILABLE",
            ExtractWarningCode::RasterizerUnavailable => "RASTERIZER_UNAVAILABLE",
            ExtractWarningCode::DegeneratePage => "DEGENERATE_PAGE",
        }
    }
}

impl fmt::Display for ExtractWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal issue encountered during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractWarning {
    /// Machine-readable warning code.
    pub code: ExtractWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// Page number where the warning occurred (0-indexed), if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl ExtractWarning {
    /// Create a document-level warning.
    pub fn new(code: ExtractWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
        }
    }

    /// Create a warning tied to a page.
    pub fn on_page(code: ExtractWarningCode, description: impl Into<String>, page: usize) -> Self {
        Self {
            code,
            description: description.into(),
            page: Some(page),
        }
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_error_display() {
        assert_eq!(
            PdfError::ParseError("invalid xref".to_string()).to_string(),
            "parse error: invalid xref"
        );
        assert_eq!(
            PdfError::IoError("file not found".to_string()).to_string(),
            "I/O error: file not found"
        );
        assert_eq!(
            PdfError::PasswordRequired.to_string(),
            "PDF is encrypted and requires a password"
        );
        assert_eq!(PdfError::Other("boom".to_string()).to_string(), "boom");
    }

    #[test]
    fn invalid_file_type_mentions_only_pdf() {
        let msg = PdfError::InvalidFileType("notes.txt".to_string()).to_string();
        assert!(msg.starts_with("Invalid file type. Only PDF files are allowed."));
        assert!(msg.contains("notes.txt"));
    }

    #[test]
    fn pdf_error_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PdfError = io.into();
        assert!(matches!(err, PdfError::IoError(ref m) if m.contains("missing")));
    }

    #[test]
    fn warning_display_with_page() {
        let w = ExtractWarning::on_page(
            ExtractWarningCode::DegeneratePage,
            "page box has zero width",
            3,
        );
        assert_eq!(
            w.to_string(),
            "[DEGENERATE_PAGE] page box has zero width (page 3)"
        );
    }

    #[test]
    fn warning_serializes_code_as_tag() {
        let w = ExtractWarning::new(ExtractWarningCode::PaintOrderUnavailable, "tokenizer failed");
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["code"], "PAINT_ORDER_UNAVAILABLE");
        assert!(json.get("page").is_none());
    }
}
