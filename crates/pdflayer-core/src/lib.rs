//! pdflayer-core: Backend-independent data types and algorithms.
//!
//! This crate provides the item model consumed by the layout editor
//! ([`Item`] and its variants), the manifest model and its flattener,
//! coordinate normalization, paint-order merging, and the geometry,
//! color, path and SVG helpers shared by the extraction passes.
//! It does not depend on any PDF parser.

pub mod data_uri;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod item;
pub mod manifest;
pub mod merge;
pub mod normalize;
pub mod options;
pub mod painting;
pub mod path;
pub mod svg;

mod flatten;

pub use data_uri::{DataUri, decode_base64, encode_data_uri, is_data_uri, sniff_mime};
pub use error::{ExtractWarning, ExtractWarningCode, PdfError};
pub use flatten::{Flattened, flatten_manifest};
pub use fonts::{DEFAULT_ASCENT_RATIO, DEFAULT_DESCENT_RATIO, FontAscentTable, canonical_font_name};
pub use geometry::{BBox, Ctm, Point};
pub use item::{
    Anchor, AnnotationItem, AnnotationSpan, AnnotationType, FieldType, FormFieldItem, ImageItem,
    Item, ItemCommon, ItemKind, PageDimensions, ShapeItem, ShapePoint, ShapeType, TextItem,
    TextSpanItem, VectorItem,
};
pub use manifest::{
    EntryMeta, InlineData, Manifest, ManifestAnnotation, ManifestFormField, ManifestImage,
    ManifestPage, ManifestShape, ManifestText, ManifestTextSpan,
};
pub use merge::{merge_items, sort_items};
pub use normalize::{Placement, normalize, normalize_point};
pub use options::{ExtractOptions, PaintOrderOptions, RasterizerConfig, ZBands};
pub use painting::{Color, FillRule, PaintRequest, PaintStyle};
pub use path::{Path, PathBuilder, PathSegment};
pub use svg::{VectorFragment, render_vector_fragment};
