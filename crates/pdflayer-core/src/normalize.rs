//! Page-space to page-relative coordinate conversion.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// A page-relative placement, top-left anchored.
///
/// Values are fractions of the page's own width and height. They are
/// never clamped: content that starts left of or above the page yields
/// negative values, content that runs past the right or bottom edge
/// yields values greater than one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: f64,
    pub height_norm: f64,
}

/// Map a page-space rectangle onto the page box.
///
/// Page space has its origin at the bottom-left; the result flips the
/// vertical axis so `0.0` is the visual top of the page. Returns `None`
/// when the page box has no area.
pub fn normalize(page: &BBox, rect: &BBox) -> Option<Placement> {
    let w = page.width();
    let h = page.height();
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(Placement {
        x_norm: (rect.x0 - page.x0) / w,
        y_norm_top: (page.y1 - rect.y1) / h,
        width_norm: rect.width() / w,
        height_norm: rect.height() / h,
    })
}

/// Normalize a single point, returning `(xNorm, yNormTop)`.
pub fn normalize_point(page: &BBox, x: f64, y: f64) -> Option<(f64, f64)> {
    let w = page.width();
    let h = page.height();
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(((x - page.x0) / w, (page.y1 - y) / h))
}
