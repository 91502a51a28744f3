//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the document access the
//! extraction pipeline needs: pages, page boxes, raw content bytes, and
//! content interpretation through a [`ContentHandler`].

use pdflayer_core::{BBox, ExtractOptions, PdfError};

use crate::handler::ContentHandler;

/// Trait abstracting PDF parsing operations.
///
/// # Associated Types
///
/// - `Document`: The parsed PDF document representation.
/// - `Page`: A reference to a single page within a document.
/// - `Error`: Backend-specific error type, convertible to [`PdfError`].
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let page_box = MyBackend::page_box(&doc, &page)?;
/// MyBackend::interpret_page(&doc, &page, &mut handler, &options)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`PdfError`].
    type Error: std::error::Error + Into<PdfError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable PDF or the
    /// document is encrypted.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// The visible page box in page space: CropBox when set, else the
    /// (possibly inherited) MediaBox.
    ///
    /// # Errors
    ///
    /// Returns an error if neither box can be resolved.
    fn page_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error>;

    /// Decoded content stream bytes of the page, multiple streams joined
    /// by a single space. Form XObjects are not expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if a content stream cannot be resolved or decoded.
    fn page_content(doc: &Self::Document, page: &Self::Page) -> Result<Vec<u8>, Self::Error>;

    /// Interpret the page's content stream, calling back into the handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the content stream is damaged. Events for the
    /// operators before the damage have already been delivered.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        options: &ExtractOptions,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CollectingHandler, GlyphEvent};
    use pdflayer_core::{Color, Point};

    #[derive(Debug)]
    struct MockDocument {
        boxes: Vec<BBox>,
    }

    #[derive(Debug)]
    struct MockPage {
        index: usize,
    }

    struct MockBackend;

    impl PdfBackend for MockBackend {
        type Document = MockDocument;
        type Page = MockPage;
        type Error = PdfError;

        fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
            if bytes.is_empty() {
                return Err(PdfError::ParseError("empty input".to_string()));
            }
            // first byte encodes the page count
            let boxes = (0..bytes[0])
                .map(|_| BBox::new(0.0, 0.0, 612.0, 792.0))
                .collect();
            Ok(MockDocument { boxes })
        }

        fn page_count(doc: &Self::Document) -> usize {
            doc.boxes.len()
        }

        fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
            if index >= doc.boxes.len() {
                return Err(PdfError::ParseError(format!(
                    "page index {index} out of range (0..{})",
                    doc.boxes.len()
                )));
            }
            Ok(MockPage { index })
        }

        fn page_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error> {
            Ok(doc.boxes[page.index])
        }

        fn page_content(_doc: &Self::Document, _page: &Self::Page) -> Result<Vec<u8>, Self::Error> {
            Ok(b"BT /F1 14 Tf 72 720 Td (H) Tj ET".to_vec())
        }

        fn interpret_page(
            _doc: &Self::Document,
            _page: &Self::Page,
            handler: &mut dyn ContentHandler,
            _options: &ExtractOptions,
        ) -> Result<(), Self::Error> {
            handler.on_glyph(GlyphEvent {
                text: "H".to_string(),
                font_name: "Times-Roman".to_string(),
                font_size: 14.0,
                origin: Point::new(72.0, 720.0),
                advance: 10.1,
                color: Color::black(),
                ascent: None,
                descent: None,
            });
            Ok(())
        }
    }

    #[test]
    fn mock_backend_open_and_pages() {
        let doc = MockBackend::open(&[2]).unwrap();
        assert_eq!(MockBackend::page_count(&doc), 2);
        let page = MockBackend::get_page(&doc, 1).unwrap();
        assert_eq!(page.index, 1);
        assert!(MockBackend::get_page(&doc, 2).is_err());
        assert!(MockBackend::open(&[]).is_err());
    }

    #[test]
    fn mock_backend_page_box_and_content() {
        let doc = MockBackend::open(&[1]).unwrap();
        let page = MockBackend::get_page(&doc, 0).unwrap();
        let page_box = MockBackend::page_box(&doc, &page).unwrap();
        assert_eq!((page_box.width(), page_box.height()), (612.0, 792.0));
        let content = MockBackend::page_content(&doc, &page).unwrap();
        assert!(content.starts_with(b"BT"));
    }

    #[test]
    fn mock_backend_interprets_through_handler() {
        let doc = MockBackend::open(&[1]).unwrap();
        let page = MockBackend::get_page(&doc, 0).unwrap();
        let mut handler = CollectingHandler::default();
        MockBackend::interpret_page(&doc, &page, &mut handler, &ExtractOptions::default())
            .unwrap();
        assert_eq!(handler.glyphs.len(), 1);
        assert_eq!(handler.glyphs[0].text, "H");
    }

    #[test]
    fn backend_errors_convert_to_pdf_error() {
        fn assert_into_pdf_error<B: PdfBackend>() {}
        assert_into_pdf_error::<MockBackend>();
        assert_into_pdf_error::<crate::lopdf_backend::LopdfBackend>();
    }
}
