//! Self-contained SVG fragments for vector items.
//!
//! Each painted path becomes its own SVG 1.1 document whose viewBox is
//! the path's bounding box, so the editor can place it exactly like an
//! image.

use std::fmt::Write as _;

use crate::data_uri::encode_data_uri;
use crate::geometry::{BBox, Point};
use crate::painting::PaintStyle;
use crate::path::{Path, PathSegment};

/// A rendered vector and the page-space box it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFragment {
    /// Page-space box of the fragment, padded by half the stroke width.
    pub bbox: BBox,
    /// SVG markup.
    pub svg: String,
}

impl VectorFragment {
    /// `data:image/svg+xml;base64,…` form of the markup.
    pub fn data_uri(&self) -> String {
        encode_data_uri("image/svg+xml", self.svg.as_bytes())
    }
}

/// Render one painted path as a standalone SVG scoped to its own box.
///
/// Returns `None` for empty paths and for boxes without area.
pub fn render_vector_fragment(path: &Path, style: &PaintStyle) -> Option<VectorFragment> {
    let bbox = path.bbox()?.expand(style.stroke_width / 2.0);
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return None;
    }

    let local = |p: &Point| (p.x - bbox.x0, bbox.y1 - p.y);
    let mut d = String::new();
    for seg in &path.segments {
        match seg {
            PathSegment::MoveTo(p) => {
                let (x, y) = local(p);
                let _ = write!(d, "M{} {} ", num(x), num(y));
            }
            PathSegment::LineTo(p) => {
                let (x, y) = local(p);
                let _ = write!(d, "L{} {} ", num(x), num(y));
            }
            PathSegment::CurveTo { cp1, cp2, end } => {
                let (x1, y1) = local(cp1);
                let (x2, y2) = local(cp2);
                let (x3, y3) = local(end);
                let _ = write!(
                    d,
                    "C{} {} {} {} {} {} ",
                    num(x1),
                    num(y1),
                    num(x2),
                    num(y2),
                    num(x3),
                    num(y3)
                );
            }
            PathSegment::ClosePath => d.push_str("Z "),
        }
    }

    let w = num(bbox.width());
    let h = num(bbox.height());
    let mut paint = String::new();
    match style.fill {
        Some(fill) => {
            let _ = write!(
                paint,
                " fill=\"{}\" fill-rule=\"{}\"",
                fill.to_hex(),
                style.fill_rule.svg_name()
            );
            if style.fill_opacity < 1.0 {
                let _ = write!(paint, " fill-opacity=\"{}\"", num(style.fill_opacity));
            }
        }
        None => paint.push_str(" fill=\"none\""),
    }
    match style.stroke {
        Some(stroke) => {
            let _ = write!(
                paint,
                " stroke=\"{}\" stroke-width=\"{}\"",
                stroke.to_hex(),
                num(style.stroke_width)
            );
            if style.stroke_opacity < 1.0 {
                let _ = write!(paint, " stroke-opacity=\"{}\"", num(style.stroke_opacity));
            }
        }
        None => paint.push_str(" stroke=\"none\""),
    }

    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
         width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <path d=\"{}\"{paint}/></svg>",
        d.trim_end()
    );
    Some(VectorFragment { bbox, svg })
}

/// Format with at most three decimals and no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
