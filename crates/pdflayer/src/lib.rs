//! pdflayer: turn PDF pages into normalized layout items.
//!
//! This is the public API facade crate of the pdflayer workspace. It
//! re-exports types from pdflayer-core and uses pdflayer-parse for PDF
//! reading and interpretation.
//!
//! A document is extracted with one of two strategies, chosen once per
//! document: an embedded `manifest.json` describing the layout is
//! preferred; otherwise items are reconstructed geometrically from the
//! page content streams. Either way the result is a flat list of
//! page-relative items sorted by page and paint order.
//!
//! # Architecture
//!
//! - **pdflayer-core**: Backend-independent data types and algorithms
//! - **pdflayer-parse**: PDF access, content interpretation, manifest location
//! - **pdflayer** (this crate): Strategy selection and geometric extraction

mod extraction;
mod geometric;
mod pdf;
pub mod rasterizer;
mod strategy;
mod text_runs;

pub use extraction::{Extraction, extract_file, is_allowed_upload};
pub use pdf::Pdf;
pub use strategy::Strategy;

pub use pdflayer_core;
pub use pdflayer_core::{
    ExtractOptions, ExtractWarning, ExtractWarningCode, Item, PageDimensions, PaintOrderOptions,
    PdfError, RasterizerConfig,
};
pub use pdflayer_parse;
