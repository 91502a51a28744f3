//! Grouping of shown glyphs into text runs.
//!
//! A run is a stretch of consecutive glyphs, in content order, that share
//! a font, a size (within tolerance) and a fill color, sit on one
//! baseline, and advance left to right without a gap wider than one font
//! size.

use pdflayer_core::{
    Anchor, BBox, Color, DEFAULT_DESCENT_RATIO, ExtractOptions, Item, ItemCommon, Point,
    TextItem, TextSpanItem, normalize_point,
};
use pdflayer_parse::GlyphEvent;

/// A grouped run of glyphs, in page space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextRun {
    /// Trimmed run text.
    pub text: String,
    pub font_name: String,
    /// Median glyph size.
    pub font_size: f64,
    pub color: Color,
    /// Origin of the first visible glyph.
    pub left: f64,
    /// End of the last visible glyph's advance.
    pub right: f64,
    /// Baseline of the run's first glyph.
    pub baseline: f64,
    /// Font descriptor ratios of the run's font, when present.
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    /// First glyph origin; used to match the run against paint operations.
    pub anchor: Point,
}

/// Group glyphs into runs, dropping whitespace-only runs.
pub(crate) fn group_runs(glyphs: &[GlyphEvent], size_tolerance: f64) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut current: Vec<&GlyphEvent> = Vec::new();
    for glyph in glyphs {
        if let Some(prev) = current.last() {
            if !continues_run(current[0], prev, glyph, size_tolerance) {
                runs.extend(finish_run(&current));
                current.clear();
            }
        }
        current.push(glyph);
    }
    runs.extend(finish_run(&current));
    runs
}

fn continues_run(first: &GlyphEvent, prev: &GlyphEvent, next: &GlyphEvent, tolerance: f64) -> bool {
    let size = first.font_size;
    next.font_name == first.font_name
        && (next.font_size - size).abs() <= tolerance
        && next.color == first.color
        && (next.origin.y - prev.origin.y).abs() <= 0.5 * size
        && next.origin.x >= prev.origin.x
        && next.origin.x - (prev.origin.x + prev.advance) <= size
}

fn finish_run(glyphs: &[&GlyphEvent]) -> Option<TextRun> {
    let first = glyphs.first()?;
    let raw: String = glyphs.iter().map(|g| g.text.as_str()).collect();
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let visible: Vec<&&GlyphEvent> = glyphs
        .iter()
        .filter(|g| !g.text.trim().is_empty())
        .collect();
    let lead = visible.first()?;
    let left = visible
        .iter()
        .map(|g| g.origin.x)
        .fold(f64::INFINITY, f64::min);
    let right = visible
        .iter()
        .map(|g| g.origin.x + g.advance)
        .fold(f64::NEG_INFINITY, f64::max);

    Some(TextRun {
        text: text.to_string(),
        font_name: first.font_name.clone(),
        font_size: median(glyphs.iter().map(|g| g.font_size).collect()),
        color: first.color,
        left,
        right,
        baseline: first.origin.y,
        ascent: first.ascent,
        descent: first.descent,
        anchor: lead.origin,
    })
}

/// Median of a non-empty list; the mean of the middle pair for even lengths.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

impl TextRun {
    /// Ascent ratio: the font descriptor's when present, else the table's.
    pub fn ascent_ratio(&self, options: &ExtractOptions) -> f64 {
        self.ascent
            .unwrap_or_else(|| options.ascent_table.ratio_for(&self.font_name))
    }

    pub fn descent_ratio(&self) -> f64 {
        self.descent.unwrap_or(DEFAULT_DESCENT_RATIO)
    }

    /// The `Text` item and its hit-testing `TextSpan`, both with `z_order`.
    pub fn to_items(
        &self,
        page_index: usize,
        page: &BBox,
        z_order: f64,
        options: &ExtractOptions,
    ) -> Option<[Item; 2]> {
        let ascent = self.ascent_ratio(options);
        let descent = self.descent_ratio();
        let top = self.baseline + self.font_size * ascent;
        let (x_norm, y_norm_top) = normalize_point(page, self.left, top)?;
        let color = self.color.to_hex();

        let text = Item::Text(TextItem {
            common: ItemCommon::new(page_index, x_norm, y_norm_top, z_order),
            text: self.text.clone(),
            font_size: Some(self.font_size),
            font_family: Some(options.font_family.clone()),
            color: Some(color.clone()),
            box_padding: None,
            id: None,
            anchor: Anchor::Top,
        });
        let span = Item::TextSpan(TextSpanItem {
            common: ItemCommon::new(page_index, x_norm, y_norm_top, z_order),
            text: self.text.clone(),
            width_norm: (self.right - self.left).max(0.0) / page.width(),
            height_norm: self.font_size * (ascent - descent) / page.height(),
            font_size: Some(self.font_size),
            font_family: Some(options.font_family.clone()),
            color: Some(color),
            id: None,
            ascent_ratio: Some(ascent),
            descent_ratio: Some(descent),
            anchor: Anchor::Top,
        });
        Some([text, span])
    }
}
