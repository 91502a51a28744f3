//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for the backend error and converts it into the
//! core [`PdfError`] at the crate boundary.

use pdflayer_core::PdfError;
use thiserror::Error;

/// Error type for document backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during content stream tokenization or interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfError),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Io(e) => PdfError::IoError(e.to_string()),
            BackendError::Interpreter(msg) => PdfError::Other(format!("interpreter error: {msg}")),
            BackendError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message() {
        let err = BackendError::Parse("invalid xref table".to_string());
        assert_eq!(err.to_string(), "PDF parse error: invalid xref table");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
        let pdf: PdfError = err.into();
        assert!(matches!(pdf, PdfError::IoError(ref m) if m.contains("file missing")));
    }

    #[test]
    fn core_error_passes_through() {
        let err: BackendError = PdfError::PasswordRequired.into();
        assert_eq!(err.to_string(), "PDF is encrypted and requires a password");
        assert_eq!(PdfError::from(err), PdfError::PasswordRequired);
    }

    #[test]
    fn interpreter_error_becomes_other() {
        let pdf: PdfError = BackendError::Interpreter("unterminated array".into()).into();
        assert_eq!(
            pdf,
            PdfError::Other("interpreter error: unterminated array".to_string())
        );
    }
}
