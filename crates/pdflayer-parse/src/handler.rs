//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter reports every shown glyph, painted path and placed
//! image through a [`ContentHandler`]. Coordinates in events are already
//! in page space.

use pdflayer_core::{BBox, Color, ExtractWarning, PaintRequest, Path, Point};

use crate::images::ImagePayload;

/// A single shown glyph.
#[derive(Debug, Clone)]
pub struct GlyphEvent {
    /// Decoded Unicode text; may be empty for unmapped codes.
    pub text: String,
    /// `/BaseFont` of the current font.
    pub font_name: String,
    /// Font size after the text matrix and CTM are applied.
    pub font_size: f64,
    /// Baseline origin of the glyph.
    pub origin: Point,
    /// Horizontal advance of the glyph in page space.
    pub advance: f64,
    pub color: Color,
    /// Font descriptor ascent as a fraction of the font size.
    pub ascent: Option<f64>,
    /// Font descriptor descent as a fraction of the font size.
    pub descent: Option<f64>,
}

/// A path painted by `S s f F f* B B* b b*`.
#[derive(Debug, Clone)]
pub struct PathEvent {
    pub path: Path,
    pub request: PaintRequest,
}

/// An image XObject placed by `Do`.
#[derive(Debug, Clone)]
pub struct ImageEvent {
    /// Resource name, e.g. `Im0`.
    pub name: String,
    /// The unit square under the CTM.
    pub bbox: BBox,
    /// CTM origin at placement.
    pub origin: Point,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub payload: ImagePayload,
}

/// Callback handler for content stream interpretation.
///
/// All methods default to no-ops so handlers subscribe only to the
/// events they need.
pub trait ContentHandler {
    fn on_glyph(&mut self, _event: GlyphEvent) {}

    fn on_path(&mut self, _event: PathEvent) {}

    fn on_image(&mut self, _event: ImageEvent) {}

    /// Non-fatal problems; interpretation continues.
    fn on_warning(&mut self, _warning: ExtractWarning) {}
}

/// Handler that records every event, mostly for tests and debugging.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    pub glyphs: Vec<GlyphEvent>,
    pub paths: Vec<PathEvent>,
    pub images: Vec<ImageEvent>,
    pub warnings: Vec<ExtractWarning>,
}

impl ContentHandler for CollectingHandler {
    fn on_glyph(&mut self, event: GlyphEvent) {
        self.glyphs.push(event);
    }

    fn on_path(&mut self, event: PathEvent) {
        self.paths.push(event);
    }

    fn on_image(&mut self, event: ImageEvent) {
        self.images.push(event);
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        self.warnings.push(warning);
    }
}
