//! Extraction configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::fonts::FontAscentTable;

/// Default paint-order bands for manifest items without an explicit `zIndex`.
///
/// The defaults stack images below shapes, shapes below annotations,
/// annotations below text, text below form fields, and text spans on
/// top of everything because they only exist for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZBands {
    pub image: f64,
    pub shape: f64,
    pub annotation: f64,
    pub text: f64,
    pub form_field: f64,
    pub text_span: f64,
}

impl Default for ZBands {
    fn default() -> Self {
        Self {
            image: -100.0,
            shape: -75.0,
            annotation: -50.0,
            text: 0.0,
            form_field: 100.0,
            text_span: 200.0,
        }
    }
}

/// Settings for paint-order reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintOrderOptions {
    /// Run reconstruction at all (default: true).
    pub enabled: bool,
    /// Weight of the horizontal distance in the L1 match metric (default: 0.5).
    pub x_weight: f64,
    /// Matches farther than this, in points, are rejected (default: 72.0).
    pub max_distance: f64,
}

impl Default for PaintOrderOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            x_weight: 0.5,
            max_distance: 72.0,
        }
    }
}

/// External rasterizer used by the deprecated vector path.
///
/// Invoked as `executable input output pageNumber` (1-based page).
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizerConfig {
    pub executable: PathBuf,
    /// The process is killed after this long (default: 30 s).
    pub timeout: Duration,
}

impl RasterizerConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Options controlling extraction behavior and resource limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Font ascent ratios for baseline-to-top conversion.
    pub ascent_table: FontAscentTable,
    /// Default manifest paint-order bands.
    pub z_bands: ZBands,
    /// Family assigned to every geometric text item (default: "Lato").
    pub font_family: String,
    /// Maximum font size difference, in points, within one text run (default: 0.5).
    pub font_size_tolerance: f64,
    /// Channel value at or above which a fill counts as white (default: 0.95).
    pub white_threshold: f64,
    pub paint_order: PaintOrderOptions,
    /// Maximum name-tree nodes visited while looking for a manifest (default: 4096).
    pub max_name_tree_nodes: usize,
    /// Maximum nesting depth for Form XObjects (default: 8).
    pub max_form_depth: usize,
    /// Deprecated vector path; disabled by default.
    pub legacy_rasterizer: Option<RasterizerConfig>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ascent_table: FontAscentTable::default(),
            z_bands: ZBands::default(),
            font_family: "Lato".to_string(),
            font_size_tolerance: 0.5,
            white_threshold: 0.95,
            paint_order: PaintOrderOptions::default(),
            max_name_tree_nodes: 4096,
            max_form_depth: 8,
            legacy_rasterizer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands_follow_stacking_order() {
        let b = ZBands::default();
        assert!(b.image < b.shape);
        assert!(b.shape < b.annotation);
        assert!(b.annotation < b.text);
        assert!(b.text < b.form_field);
        assert!(b.form_field < b.text_span);
    }

    #[test]
    fn defaults() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.font_family, "Lato");
        assert!(opts.paint_order.enabled);
        assert!(opts.legacy_rasterizer.is_none());
        assert_eq!(opts.ascent_table.default_ratio(), 0.96);
    }

    #[test]
    fn rasterizer_default_timeout() {
        let cfg = RasterizerConfig::new("/usr/bin/pdf2svg");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }
}
