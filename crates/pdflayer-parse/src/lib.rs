//! pdflayer-parse: PDF document access for the pdflayer pipeline.
//!
//! This crate reads documents through [`lopdf`] behind the [`PdfBackend`]
//! trait, interprets page content streams into glyph, path and image
//! events, locates embedded layout manifests, and reconstructs
//! approximate paint order from raw operator streams. It depends on
//! pdflayer-core for shared data types.

pub mod backend;
pub mod cmap;
pub mod error;
pub mod fonts;
pub mod handler;
pub mod images;
pub mod interpreter;
pub mod lopdf_backend;
pub mod manifest_locator;
pub mod paint_order;
pub mod tokenizer;

mod objects;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use handler::{CollectingHandler, ContentHandler, GlyphEvent, ImageEvent, PathEvent};
pub use images::ImagePayload;
pub use interpreter::interpret_content;
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use manifest_locator::{
    LocatedManifest, MANIFEST_FILE_NAME, ManifestSource, decode_json_object, locate_manifest,
};
pub use paint_order::{PaintKind, PaintOp, match_paint_order, reconstruct_paint_ops};
pub use pdflayer_core;
