use serde::{Deserialize, Serialize};

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Affine transformation matrix `[a b c d e f]`.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, matching the
/// operand order of the PDF `cm` and `Tm` operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ctm {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Build from a six-element operand array.
    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    pub fn to_array(self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Returns `self × other`: apply `self` first, then `other`.
    ///
    /// For `cm`, the new CTM is `operand.concat(&current)`.
    pub fn concat(&self, other: &Ctm) -> Ctm {
        Ctm {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Transform a distance vector (ignores translation).
    pub fn transform_vector(&self, dx: f64, dy: f64) -> (f64, f64) {
        (self.a * dx + self.c * dy, self.b * dx + self.d * dy)
    }

    /// Mean scale factor, used to map line widths into page space.
    pub fn scale(&self) -> f64 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        (sx + sy) / 2.0
    }
}

/// Axis-aligned rectangle in page space (origin bottom-left, y grows upward).
///
/// - `x0`: left edge
/// - `y0`: bottom edge
/// - `x1`: right edge
/// - `y1`: top edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    /// Create a box, normalizing swapped corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<BBox> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let point_box = |p: Point| BBox {
            x0: p.x,
            y0: p.y,
            x1: p.x,
            y1: p.y,
        };
        Some(iter.fold(point_box(first), |bbox, p| bbox.union(&point_box(p))))
    }

    /// Bounding box of a rectangle after transformation by `ctm`.
    pub fn transformed(&self, ctm: &Ctm) -> BBox {
        let corners = [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x1, self.y1),
            Point::new(self.x0, self.y1),
        ];
        // four corners always yield a box
        BBox::from_points(corners.into_iter().map(|p| ctm.transform_point(p))).unwrap_or(*self)
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> BBox {
        BBox {
            x0: self.x0 - amount,
            y0: self.y0 - amount,
            x1: self.x1 + amount,
            y1: self.y1 + amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn test_bbox_new_normalizes_corners() {
        let bbox = BBox::new(30.0, 40.0, 10.0, 20.0);
        assert_eq!(bbox.x0, 10.0);
        assert_eq!(bbox.y0, 20.0);
        assert_eq!(bbox.x1, 30.0);
        assert_eq!(bbox.y1, 40.0);
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BBox::new(10.0, 20.0, 50.0, 60.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(10.0, 20.0, 30.0, 40.0);
        let b = BBox::new(5.0, 25.0, 35.0, 45.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_ctm_concat_translation_then_scale() {
        let translate = Ctm::translation(10.0, 20.0);
        let scale = Ctm::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let combined = translate.concat(&scale);
        let p = combined.transform_point(Point::new(1.0, 1.0));
        assert_approx(p.x, 22.0);
        assert_approx(p.y, 42.0);
    }

    #[test]
    fn test_ctm_identity_is_neutral() {
        let m = Ctm::new(1.5, 0.2, -0.3, 2.0, 7.0, 9.0);
        assert_eq!(m.concat(&Ctm::identity()), m);
        assert_eq!(Ctm::identity().concat(&m), m);
    }

    #[test]
    fn test_bbox_transformed_by_flip() {
        let flip = Ctm::new(1.0, 0.0, 0.0, -1.0, 0.0, 100.0);
        let b = BBox::new(0.0, 10.0, 20.0, 30.0).transformed(&flip);
        assert_eq!(b, BBox::new(0.0, 70.0, 20.0, 90.0));
    }

    #[test]
    fn test_ctm_scale() {
        assert_approx(Ctm::new(2.0, 0.0, 0.0, 4.0, 0.0, 0.0).scale(), 3.0);
    }
}
