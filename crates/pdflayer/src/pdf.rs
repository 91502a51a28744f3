//! Top-level document handle.

use std::path::{Path, PathBuf};

use pdflayer_core::{
    BBox, ExtractOptions, ExtractWarning, PageDimensions, PdfError, merge_items,
};
use pdflayer_parse::{LopdfBackend, LopdfDocument, PdfBackend};
use tracing::{debug, info_span};

use crate::extraction::Extraction;
use crate::geometric::extract_page;
use crate::strategy::{Plan, Strategy, plan};

/// A PDF document opened for layout extraction.
///
/// # Example
///
/// ```ignore
/// let pdf = Pdf::open_file("brochure.pdf", None)?;
/// let extraction = pdf.extract();
/// println!("{}", serde_json::to_string(&extraction)?);
/// ```
pub struct Pdf {
    doc: LopdfDocument,
    options: ExtractOptions,
    /// Resolved page boxes; a zero box when none could be resolved.
    page_boxes: Vec<BBox>,
    /// File the document was read from, needed by the legacy rasterizer.
    source: Option<PathBuf>,
}

impl Pdf {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read, is not a valid
    /// PDF, or is encrypted.
    pub fn open_file(
        path: impl AsRef<Path>,
        options: Option<ExtractOptions>,
    ) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut pdf = Self::open(&bytes, options)?;
        pdf.source = Some(path.to_path_buf());
        Ok(pdf)
    }

    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the bytes are not a valid PDF or the
    /// document is encrypted.
    pub fn open(bytes: &[u8], options: Option<ExtractOptions>) -> Result<Self, PdfError> {
        let doc = LopdfBackend::open(bytes).map_err(PdfError::from)?;
        let options = options.unwrap_or_default();

        let page_boxes = (0..LopdfBackend::page_count(&doc))
            .map(|index| {
                LopdfBackend::get_page(&doc, index)
                    .and_then(|page| LopdfBackend::page_box(&doc, &page))
                    .unwrap_or_else(|e| {
                        debug!(page = index, error = %e, "page box unresolved");
                        BBox::new(0.0, 0.0, 0.0, 0.0)
                    })
            })
            .collect();

        Ok(Self {
            doc,
            options,
            page_boxes,
            source: None,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_boxes.len()
    }

    /// Visible box of page `index`; a zero box when out of range or unresolved.
    pub fn page_box(&self, index: usize) -> BBox {
        self.page_boxes
            .get(index)
            .copied()
            .unwrap_or_else(|| BBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Dimensions of the first page, used when a manifest has no `pageSize`.
    pub fn document_dimensions(&self) -> PageDimensions {
        let first = self.page_box(0);
        PageDimensions {
            width: first.width(),
            height: first.height(),
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Path passed to [`Pdf::open_file`], if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Access the parsed document.
    pub fn document(&self) -> &LopdfDocument {
        &self.doc
    }

    /// The strategy [`Pdf::extract`] would use.
    pub fn strategy(&self) -> Strategy {
        Strategy::select(self, &self.options)
    }

    /// Extract every item of the document.
    ///
    /// Recoverable problems never fail extraction; they are reported in
    /// [`Extraction::warnings`].
    pub fn extract(&self) -> Extraction {
        let _span = info_span!("extract", pages = self.page_count()).entered();
        let mut warnings: Vec<ExtractWarning> = Vec::new();

        match plan(self, &self.options, &mut warnings) {
            Plan::Manifest(flattened) => {
                warnings.extend(flattened.warnings);
                Extraction {
                    items: merge_items([flattened.items]),
                    page_dimensions: flattened.page_dimensions,
                    strategy: Strategy::Manifest,
                    warnings,
                }
            }
            Plan::Geometric => {
                let batches: Vec<_> = (0..self.page_count())
                    .map(|index| {
                        let page = extract_page(self, index);
                        warnings.extend(page.warnings);
                        page.items
                    })
                    .collect();
                Extraction {
                    items: merge_items(batches),
                    page_dimensions: self.document_dimensions(),
                    strategy: Strategy::Geometric,
                    warnings,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, Stream, dictionary};

    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for media in [[0, 0, 612, 792], [0, 0, 842, 595]] {
            let content = doc.add_object(Stream::new(dictionary! {}, b"0 0 m S".to_vec()));
            kids.push(Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media.map(Object::Integer).to_vec(),
                "Contents" => content,
            })));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn caches_page_boxes() {
        let pdf = Pdf::open(&two_page_pdf(), None).unwrap();
        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pdf.page_box(1).width(), 842.0);
        assert_eq!(pdf.page_box(5).width(), 0.0);
        let dims = pdf.document_dimensions();
        assert_eq!((dims.width, dims.height), (612.0, 792.0));
        assert!(pdf.source_path().is_none());
    }

    #[test]
    fn open_rejects_garbage() {
        let err = Pdf::open(b"not a pdf", None).err().unwrap();
        assert!(matches!(err, PdfError::ParseError(_)));
    }

    #[test]
    fn open_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, two_page_pdf()).unwrap();
        let pdf = Pdf::open_file(&path, None).unwrap();
        assert_eq!(pdf.source_path(), Some(path.as_path()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Pdf::open_file("/nonexistent/doc.pdf", None).err().unwrap();
        assert!(matches!(err, PdfError::IoError(_)));
    }

    #[test]
    fn document_without_content_is_geometric_and_empty() {
        let pdf = Pdf::open(&two_page_pdf(), None).unwrap();
        assert_eq!(pdf.strategy(), Strategy::Geometric);
        let extraction = pdf.extract();
        assert!(extraction.items.is_empty());
        assert!(extraction.warnings.is_empty());
    }
}
