//! Colors and the fill/stroke decision for painted paths.

/// Simple RGB color with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Create a new RGB color with values in [0.0, 1.0].
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Black color (0, 0, 0).
    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    /// Naive CMYK to RGB conversion.
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Interpret 1, 3 or 4 color operands as gray, RGB or CMYK.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [g] => Some(Self::gray(*g)),
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            [c, m, y, k] => Some(Self::from_cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }

    /// `#rrggbb` hex form.
    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    /// True when every channel is at or above `threshold`.
    pub fn is_near_white(&self, threshold: f64) -> bool {
        self.r >= threshold && self.g >= threshold && self.b >= threshold
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Fill rule for path painting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillRule {
    /// Nonzero winding number rule (default).
    #[default]
    NonZeroWinding,
    /// Even-odd rule.
    EvenOdd,
}

impl FillRule {
    /// SVG `fill-rule` attribute value.
    pub fn svg_name(&self) -> &'static str {
        match self {
            FillRule::NonZeroWinding => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// What a painting operator asked for, before the fill/stroke decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintRequest {
    /// Stroke color when the operator strokes.
    pub stroke_color: Option<Color>,
    /// Fill color when the operator fills.
    pub fill_color: Option<Color>,
    /// Line width in page space.
    pub line_width: f64,
    /// Explicit fill opacity (`/ca`), if the graphics state set one.
    pub fill_opacity: Option<f64>,
    /// Explicit stroke opacity (`/CA`), if the graphics state set one.
    pub stroke_opacity: Option<f64>,
    pub fill_rule: FillRule,
    /// Rectangle or closed quadrilateral.
    pub closed_primitive: bool,
}

/// Resolved paint style of a vector item.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    pub fill: Option<Color>,
    pub fill_opacity: f64,
    pub fill_rule: FillRule,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
}

impl PaintStyle {
    /// Decide fill and stroke intent.
    ///
    /// Stroke is present when a stroke color exists with positive width.
    /// Fill is present when a fill color exists, unless the drawing is
    /// stroke-only: fill opacity explicitly zero, or no fill color and a
    /// path that is not a closed primitive.
    pub fn resolve(req: &PaintRequest) -> PaintStyle {
        let stroke = req.stroke_color.filter(|_| req.line_width > 0.0);
        let stroke_only = req.fill_opacity == Some(0.0)
            || (req.fill_color.is_none() && !req.closed_primitive);
        let fill = if stroke_only { None } else { req.fill_color };
        PaintStyle {
            fill,
            fill_opacity: req.fill_opacity.unwrap_or(1.0),
            fill_rule: req.fill_rule,
            stroke,
            stroke_width: if stroke.is_some() { req.line_width } else { 0.0 },
            stroke_opacity: req.stroke_opacity.unwrap_or(1.0),
        }
    }

    /// Nothing would be drawn.
    pub fn is_invisible(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none()
    }

    /// A white or near-white fill with no stroke, typically a page background.
    pub fn is_background_artifact(&self, white_threshold: f64) -> bool {
        self.stroke.is_none()
            && self
                .fill
                .is_some_and(|fill| fill.is_near_white(white_threshold))
    }
}
