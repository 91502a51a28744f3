//! The extraction result and the upload-boundary entry point.

use std::path::Path;

use pdflayer_core::{ExtractOptions, ExtractWarning, Item, PageDimensions, PdfError};
use serde::Serialize;
use tracing::info;

use crate::pdf::Pdf;
use crate::strategy::Strategy;

/// Items of a whole document, ordered by page then paint order.
///
/// Serializes as `{"items": [...], "pageDimensions": {...}}`; the
/// strategy and warnings are diagnostics and are not serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub items: Vec<Item>,
    pub page_dimensions: PageDimensions,
    #[serde(skip)]
    pub strategy: Strategy,
    #[serde(skip)]
    pub warnings: Vec<ExtractWarning>,
}

/// Whether an uploaded file name is accepted: a `.pdf` extension in any case.
pub fn is_allowed_upload(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extract the document saved at `path`.
///
/// # Errors
///
/// [`PdfError::InvalidFileType`] when the file name is not a PDF name,
/// and the open errors of [`Pdf::open_file`]. Once the document is open
/// extraction always succeeds.
pub fn extract_file(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Extraction, PdfError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_allowed_upload(&file_name) {
        return Err(PdfError::InvalidFileType(file_name));
    }

    let pdf = Pdf::open_file(path, Some(options.clone()))?;
    let extraction = pdf.extract();
    info!(
        file = %file_name,
        strategy = %extraction.strategy,
        items = extraction.items.len(),
        warnings = extraction.warnings.len(),
        "extracted"
    );
    Ok(extraction)
}
