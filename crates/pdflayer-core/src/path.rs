//! Vector path model built from PDF path construction operators.

use crate::geometry::{BBox, Ctm, Point};

/// A segment of a path, in page space.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Move to a new point (starts a new subpath).
    MoveTo(Point),
    /// Straight line from current point to target.
    LineTo(Point),
    /// Cubic Bezier curve with two control points and an endpoint.
    CurveTo {
        /// First control point.
        cp1: Point,
        /// Second control point.
        cp2: Point,
        /// Endpoint of the curve.
        end: Point,
    },
    /// Close the current subpath (line back to the subpath start).
    ClosePath,
}

/// A complete path consisting of segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// The path segments.
    pub segments: Vec<PathSegment>,
    /// True when at least one subpath was appended by `re`.
    pub has_rectangle: bool,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First point of the path, used as its paint-order anchor.
    pub fn first_point(&self) -> Option<Point> {
        self.segments.iter().find_map(|seg| match seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(*p),
            PathSegment::CurveTo { end, .. } => Some(*end),
            PathSegment::ClosePath => None,
        })
    }

    /// Bounding box over every point including curve control points.
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(self.segments.iter().flat_map(|seg| {
            let pts: Vec<Point> = match seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![*p],
                PathSegment::CurveTo { cp1, cp2, end } => vec![*cp1, *cp2, *end],
                PathSegment::ClosePath => Vec::new(),
            };
            pts
        }))
    }

    /// Rectangles and closed quadrilaterals.
    ///
    /// A quadrilateral is a single subpath of four distinct corners joined
    /// by straight lines and closed, either explicitly with `h` or by a
    /// final line back to the start.
    pub fn is_closed_primitive(&self) -> bool {
        self.has_rectangle || self.is_closed_quad()
    }

    fn is_closed_quad(&self) -> bool {
        let mut corners: Vec<Point> = Vec::new();
        let mut closed = false;
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::MoveTo(p) if i == 0 => corners.push(*p),
                PathSegment::LineTo(p) if !closed => corners.push(*p),
                PathSegment::ClosePath if i == self.segments.len() - 1 => closed = true,
                _ => return false,
            }
        }
        if corners.len() == 5 && same_point(corners[0], corners[4]) {
            corners.pop();
            closed = true;
        }
        closed && corners.len() == 4
    }
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

/// Builder for constructing paths from PDF path operators.
///
/// Coordinates are transformed through the CTM before storage.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    current_point: Option<Point>,
    subpath_start: Option<Point>,
    has_rectangle: bool,
    ctm: Ctm,
}

impl PathBuilder {
    /// Create a new PathBuilder with the given CTM.
    pub fn new(ctm: Ctm) -> Self {
        Self {
            segments: Vec::new(),
            current_point: None,
            subpath_start: None,
            has_rectangle: false,
            ctm,
        }
    }

    /// Update the CTM.
    pub fn set_ctm(&mut self, ctm: Ctm) {
        self.ctm = ctm;
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `m` operator: move to a new point, starting a new subpath.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::MoveTo(p));
        self.current_point = Some(p);
        self.subpath_start = Some(p);
    }

    /// `l` operator: straight line from current point to `(x, y)`.
    pub fn line_to(&mut self, x: f64, y: f64) {
        let p = self.ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::LineTo(p));
        self.current_point = Some(p);
    }

    /// `c` operator: cubic Bezier curve with three coordinate pairs.
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let cp1 = self.ctm.transform_point(Point::new(x1, y1));
        let cp2 = self.ctm.transform_point(Point::new(x2, y2));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo { cp1, cp2, end });
        self.current_point = Some(end);
    }

    /// `v` operator: first control point equals the current point.
    pub fn curve_to_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let Some(cp1) = self.current_point else {
            return;
        };
        let cp2 = self.ctm.transform_point(Point::new(x2, y2));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo { cp1, cp2, end });
        self.current_point = Some(end);
    }

    /// `y` operator: last control point equals the endpoint.
    pub fn curve_to_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        let cp1 = self.ctm.transform_point(Point::new(x1, y1));
        let end = self.ctm.transform_point(Point::new(x3, y3));
        self.segments
            .push(PathSegment::CurveTo { cp1, cp2: end, end });
        self.current_point = Some(end);
    }

    /// `h` operator: close the current subpath.
    pub fn close_path(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        self.segments.push(PathSegment::ClosePath);
        if let Some(start) = self.subpath_start {
            self.current_point = Some(start);
        }
    }

    /// `re` operator: append a rectangle as moveto + 3 lineto + closepath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
        self.has_rectangle = true;
    }

    /// Take the accumulated path and reset the builder for the next one.
    pub fn take_path(&mut self) -> Path {
        self.current_point = None;
        self.subpath_start = None;
        Path {
            segments: std::mem::take(&mut self.segments),
            has_rectangle: std::mem::replace(&mut self.has_rectangle, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_approx(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn rectangle_is_closed_primitive() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.rectangle(10.0, 20.0, 100.0, 50.0);
        let path = b.take_path();
        assert_eq!(path.segments.len(), 5);
        assert!(path.has_rectangle);
        assert!(path.is_closed_primitive());
        assert_eq!(path.bbox(), Some(BBox::new(10.0, 20.0, 110.0, 70.0)));
    }

    #[test]
    fn explicit_quad_is_closed_primitive() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 2.0);
        b.line_to(12.0, 12.0);
        b.line_to(1.0, 9.0);
        b.close_path();
        assert!(b.take_path().is_closed_primitive());
    }

    #[test]
    fn quad_closed_by_returning_line() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        b.line_to(0.0, 10.0);
        b.line_to(0.0, 0.0);
        assert!(b.take_path().is_closed_primitive());
    }

    #[test]
    fn open_polyline_is_not_closed_primitive() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        b.line_to(0.0, 10.0);
        assert!(!b.take_path().is_closed_primitive());
    }

    #[test]
    fn triangle_is_not_closed_primitive() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(5.0, 8.0);
        b.close_path();
        assert!(!b.take_path().is_closed_primitive());
    }

    #[test]
    fn ctm_applied_to_points() {
        let mut b = PathBuilder::new(Ctm::new(2.0, 0.0, 0.0, 2.0, 5.0, 5.0));
        b.move_to(1.0, 1.0);
        b.line_to(2.0, 3.0);
        let path = b.take_path();
        assert_point_approx(path.first_point().unwrap(), 7.0, 7.0);
        match path.segments[1] {
            PathSegment::LineTo(p) => assert_point_approx(p, 9.0, 11.0),
            ref other => panic!("expected LineTo, got {other:?}"),
        }
    }

    #[test]
    fn curve_v_uses_current_point() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.move_to(1.0, 1.0);
        b.curve_to_v(5.0, 5.0, 9.0, 1.0);
        let path = b.take_path();
        match path.segments[1] {
            PathSegment::CurveTo { cp1, cp2, end } => {
                assert_point_approx(cp1, 1.0, 1.0);
                assert_point_approx(cp2, 5.0, 5.0);
                assert_point_approx(end, 9.0, 1.0);
            }
            ref other => panic!("expected CurveTo, got {other:?}"),
        }
    }

    #[test]
    fn curve_v_without_current_point_is_ignored() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.curve_to_v(5.0, 5.0, 9.0, 1.0);
        assert!(b.is_empty());
    }

    #[test]
    fn take_path_resets_rectangle_flag() {
        let mut b = PathBuilder::new(Ctm::identity());
        b.rectangle(0.0, 0.0, 1.0, 1.0);
        let _ = b.take_path();
        b.move_to(0.0, 0.0);
        b.line_to(1.0, 1.0);
        let second = b.take_path();
        assert!(!second.has_rectangle);
        assert_eq!(second.segments.len(), 2);
    }
}
