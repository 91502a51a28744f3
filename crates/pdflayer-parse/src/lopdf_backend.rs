//! lopdf-based PDF parsing backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate. This is the backend the pdflayer facade uses.

use std::sync::LazyLock;

use lopdf::{Dictionary, Object, ObjectId};
use pdflayer_core::{BBox, ExtractOptions, PdfError};

use crate::backend::PdfBackend;
use crate::error::BackendError;
use crate::handler::ContentHandler;
use crate::interpreter::interpret_content;
use crate::objects::{bbox_from_array, decode_stream, resolve};

static EMPTY_RESOURCES: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A reference to a single page within a [`LopdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct LopdfPage {
    /// The lopdf object ID for this page.
    pub object_id: ObjectId,
    /// The 0-based page index.
    pub index: usize,
}

/// The lopdf-based PDF backend.
///
/// # Example
///
/// ```ignore
/// use pdflayer_parse::{LopdfBackend, PdfBackend};
///
/// let doc = LopdfBackend::open(pdf_bytes)?;
/// let page = LopdfBackend::get_page(&doc, 0)?;
/// let page_box = LopdfBackend::page_box(&doc, &page)?;
/// ```
pub struct LopdfBackend;

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // a malformed /Parent chain can loop
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain too deep".to_string()))
}

fn page_dict(doc: &lopdf::Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    doc.get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))
}

fn inherited_box(
    doc: &lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<BBox>, BackendError> {
    match resolve_inherited(doc, page_id, key)? {
        Some(obj) => {
            let array = obj.as_array().map_err(|e| {
                BackendError::Parse(format!(
                    "{} is not an array: {e}",
                    String::from_utf8_lossy(key)
                ))
            })?;
            bbox_from_array(doc, array).map(Some)
        }
        None => Ok(None),
    }
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both a single stream and an array of streams.
fn page_content_bytes(doc: &lopdf::Document, page: &Dictionary) -> Result<Vec<u8>, BackendError> {
    let contents = match page.get(b"Contents") {
        Ok(obj) => resolve(doc, obj),
        // page with no content
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Stream(stream) => decode_stream(stream),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Get the resources dictionary for a page, handling inheritance.
fn page_resources(doc: &lopdf::Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_RESOURCES),
    }
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = LopdfPage;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Core(PdfError::PasswordRequired));
        }

        // get_pages is keyed by 1-based page number
        let page_ids = inner.get_pages().into_values().collect();
        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
        match doc.page_ids.get(index) {
            Some(&object_id) => Ok(LopdfPage { object_id, index }),
            None => Err(BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                doc.page_ids.len()
            ))),
        }
    }

    fn page_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error> {
        if let Some(crop) = inherited_box(&doc.inner, page.object_id, b"CropBox")? {
            return Ok(crop);
        }
        inherited_box(&doc.inner, page.object_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))
    }

    fn page_content(doc: &Self::Document, page: &Self::Page) -> Result<Vec<u8>, Self::Error> {
        let dict = page_dict(&doc.inner, page.object_id)?;
        page_content_bytes(&doc.inner, dict)
    }

    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        options: &ExtractOptions,
    ) -> Result<(), Self::Error> {
        let inner = &doc.inner;
        let content = page_content_bytes(inner, page_dict(inner, page.object_id)?)?;
        let resources = page_resources(inner, page.object_id)?;
        interpret_content(inner, &content, resources, handler, options)
    }
}
