//! Typed view over an embedded layout manifest.
//!
//! The manifest is untrusted JSON. Parsing is done field by field from a
//! [`serde_json::Value`]: an entry missing its required placement is
//! rejected as a whole, while a malformed optional field is simply left
//! unset. Rejections are recorded on the page so the flattener can
//! report them.
//!
//! ```json
//! { "pageSize": {"width": 612, "height": 792},
//!   "pages": [ { "texts": [], "textSpans": [], "images": [],
//!                "shapes": [], "formFields": [], "annotations": [] } ] }
//! ```

use serde_json::{Map, Value};

use crate::data_uri::{DataUri, decode_base64, is_data_uri};
use crate::item::{AnnotationSpan, AnnotationType, FieldType, PageDimensions, ShapePoint, ShapeType};

/// Display attributes every manifest entry may carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMeta {
    /// Explicit paint order (`zIndex` or `zOrder`).
    pub z_index: Option<f64>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub name: Option<String>,
}

impl EntryMeta {
    fn read(obj: &Map<String, Value>) -> Self {
        Self {
            z_index: number_of(obj, &["zIndex", "zOrder"]),
            visible: boolean(obj, "visible"),
            locked: boolean(obj, "locked"),
            name: string(obj, "name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestText {
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub text: String,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub box_padding: Option<f64>,
    pub id: Option<String>,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestTextSpan {
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: f64,
    pub height_norm: f64,
    pub text: String,
    pub font_size: Option<f64>,
    pub ascent_ratio: Option<f64>,
    pub descent_ratio: Option<f64>,
    pub id: Option<String>,
    pub meta: EntryMeta,
}

/// Inline pixel content carried by an image entry.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineData {
    /// Already a `data:` URI.
    DataUri(String),
    /// Decoded bytes (from base64 text or a byte array).
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestImage {
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: Option<f64>,
    pub height_norm: Option<f64>,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    /// `ref`, `src`, `dataUrl` or `url`, whichever comes first.
    pub reference: Option<String>,
    /// `data`, `bytes` or `base64`, decoded.
    pub inline: Option<InlineData>,
    pub mime_type: Option<String>,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestShape {
    pub shape_type: ShapeType,
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: f64,
    pub height_norm: f64,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill_color: Option<String>,
    pub points: Option<Vec<ShapePoint>>,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestFormField {
    pub field_type: FieldType,
    pub field_name: Option<String>,
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: f64,
    pub height_norm: f64,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub default_value: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
    pub group_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub border_color: Option<String>,
    pub border_width: Option<f64>,
    pub meta: EntryMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestAnnotation {
    pub annotation_type: AnnotationType,
    pub spans: Vec<AnnotationSpan>,
    pub color: Option<String>,
    pub opacity: Option<f64>,
    pub id: Option<String>,
    pub annotated_text: Option<String>,
    pub linked_text_id: Option<String>,
    pub meta: EntryMeta,
}

/// One page of the manifest, with the entries that passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestPage {
    pub texts: Vec<ManifestText>,
    pub text_spans: Vec<ManifestTextSpan>,
    pub images: Vec<ManifestImage>,
    pub shapes: Vec<ManifestShape>,
    pub form_fields: Vec<ManifestFormField>,
    pub annotations: Vec<ManifestAnnotation>,
    /// Human-readable reasons for rejected entries, e.g. `texts[2]: missing xNorm`.
    pub rejected: Vec<String>,
}

/// A validated manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub page_size: Option<PageDimensions>,
    pub pages: Vec<ManifestPage>,
}

impl Manifest {
    /// Parse a manifest value.
    ///
    /// Returns `None` when the root is not an object or has no `pages`
    /// array; that makes the whole manifest unusable.
    pub fn from_value(value: &Value) -> Option<Manifest> {
        let root = value.as_object()?;
        let pages = root.get("pages")?.as_array()?;
        let page_size = root
            .get("pageSize")
            .and_then(Value::as_object)
            .and_then(|size| {
                let width = number(size, "width")?;
                let height = number(size, "height")?;
                (width > 0.0 && height > 0.0).then_some(PageDimensions { width, height })
            });
        let pages = pages
            .iter()
            .map(|page| match page.as_object() {
                Some(obj) => ManifestPage::from_object(obj),
                None => ManifestPage {
                    rejected: vec!["page is not an object".to_string()],
                    ..ManifestPage::default()
                },
            })
            .collect();
        Some(Manifest { page_size, pages })
    }
}

impl ManifestPage {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let mut page = ManifestPage::default();
        page.texts = collect(obj, "texts", &mut page.rejected, parse_text);
        page.text_spans = collect(obj, "textSpans", &mut page.rejected, parse_text_span);
        page.images = collect(obj, "images", &mut page.rejected, parse_image);
        page.shapes = collect(obj, "shapes", &mut page.rejected, parse_shape);
        page.form_fields = collect(obj, "formFields", &mut page.rejected, parse_form_field);
        page.annotations = collect(obj, "annotations", &mut page.rejected, parse_annotation);
        page
    }
}

type Parser<T> = fn(&Map<String, Value>) -> Result<T, &'static str>;

fn collect<T>(
    page: &Map<String, Value>,
    key: &str,
    rejected: &mut Vec<String>,
    parse: Parser<T>,
) -> Vec<T> {
    let Some(entries) = page.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let result = match entry.as_object() {
            Some(obj) => parse(obj),
            None => Err("not an object"),
        };
        match result {
            Ok(parsed) => out.push(parsed),
            Err(reason) => rejected.push(format!("{key}[{i}]: {reason}")),
        }
    }
    out
}

fn placement(obj: &Map<String, Value>) -> Result<(f64, f64), &'static str> {
    match (number(obj, "xNorm"), number(obj, "yNormTop")) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err("missing xNorm/yNormTop"),
    }
}

fn parse_text(obj: &Map<String, Value>) -> Result<ManifestText, &'static str> {
    let (x_norm, y_norm_top) = placement(obj)?;
    Ok(ManifestText {
        x_norm,
        y_norm_top,
        text: text_value(obj, "text").unwrap_or_default(),
        font_size: number(obj, "fontSize").filter(|s| *s > 0.0),
        font_family: string(obj, "fontFamily"),
        color: string(obj, "color"),
        box_padding: number_of(obj, &["boxPadding", "padding"]),
        id: id_value(obj, "id"),
        meta: EntryMeta::read(obj),
    })
}

fn parse_text_span(obj: &Map<String, Value>) -> Result<ManifestTextSpan, &'static str> {
    let (x_norm, y_norm_top) = placement(obj)?;
    let (Some(width_norm), Some(height_norm)) =
        (number(obj, "widthNorm"), number(obj, "heightNorm"))
    else {
        return Err("missing widthNorm/heightNorm");
    };
    Ok(ManifestTextSpan {
        x_norm,
        y_norm_top,
        width_norm,
        height_norm,
        text: text_value(obj, "text").unwrap_or_default(),
        font_size: number(obj, "fontSize").filter(|s| *s > 0.0),
        ascent_ratio: number(obj, "ascentRatio"),
        descent_ratio: number(obj, "descentRatio"),
        id: id_value(obj, "id"),
        meta: EntryMeta::read(obj),
    })
}

fn parse_image(obj: &Map<String, Value>) -> Result<ManifestImage, &'static str> {
    let (x_norm, y_norm_top) = placement(obj)?;
    Ok(ManifestImage {
        x_norm,
        y_norm_top,
        width_norm: number(obj, "widthNorm"),
        height_norm: number(obj, "heightNorm"),
        pixel_width: pixels(obj, &["pixelWidth", "width"]),
        pixel_height: pixels(obj, &["pixelHeight", "height"]),
        reference: ["ref", "src", "dataUrl", "url"]
            .iter()
            .find_map(|key| string(obj, key))
            .filter(|s| !s.trim().is_empty()),
        inline: ["data", "bytes", "base64"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(inline_data)),
        mime_type: string_of(obj, &["mimeType", "mime"]),
        meta: EntryMeta::read(obj),
    })
}

fn parse_shape(obj: &Map<String, Value>) -> Result<ManifestShape, &'static str> {
    let (x_norm, y_norm_top) = placement(obj)?;
    let shape_type = string_of(obj, &["shapeType", "type"])
        .and_then(|t| ShapeType::parse(&t))
        .ok_or("unknown shape type")?;
    let points = obj.get("points").and_then(Value::as_array).map(|pts| {
        pts.iter()
            .filter_map(Value::as_object)
            .filter_map(|p| {
                Some(ShapePoint {
                    x: number(p, "x")?,
                    y: number(p, "y")?,
                })
            })
            .collect()
    });
    Ok(ManifestShape {
        shape_type,
        x_norm,
        y_norm_top,
        width_norm: number(obj, "widthNorm").unwrap_or(0.0),
        height_norm: number(obj, "heightNorm").unwrap_or(0.0),
        stroke_color: string(obj, "strokeColor"),
        stroke_width: number(obj, "strokeWidth").filter(|w| *w >= 0.0),
        fill_color: string(obj, "fillColor"),
        points,
        meta: EntryMeta::read(obj),
    })
}

fn parse_form_field(obj: &Map<String, Value>) -> Result<ManifestFormField, &'static str> {
    let (x_norm, y_norm_top) = placement(obj)?;
    let field_type = string_of(obj, &["fieldType", "type"])
        .and_then(|t| FieldType::parse(&t))
        .ok_or("unknown field type")?;
    let options = obj.get("options").and_then(Value::as_array).map(|opts| {
        opts.iter()
            .filter_map(|o| o.as_str().map(str::to_string))
            .collect()
    });
    Ok(ManifestFormField {
        field_type,
        field_name: string(obj, "fieldName"),
        x_norm,
        y_norm_top,
        width_norm: number(obj, "widthNorm").unwrap_or(0.0),
        height_norm: number(obj, "heightNorm").unwrap_or(0.0),
        label: string(obj, "label"),
        placeholder: string(obj, "placeholder"),
        default_value: text_value(obj, "defaultValue"),
        required: boolean(obj, "required"),
        options,
        group_name: string(obj, "groupName"),
        font_size: number(obj, "fontSize").filter(|s| *s > 0.0),
        font_family: string(obj, "fontFamily"),
        text_color: string(obj, "textColor"),
        background_color: string(obj, "backgroundColor"),
        border_color: string(obj, "borderColor"),
        border_width: number(obj, "borderWidth").filter(|w| *w >= 0.0),
        meta: EntryMeta::read(obj),
    })
}

fn parse_annotation(obj: &Map<String, Value>) -> Result<ManifestAnnotation, &'static str> {
    let annotation_type = string_of(obj, &["annotationType", "type"])
        .and_then(|t| AnnotationType::parse(&t))
        .ok_or("unknown annotation type")?;
    let spans: Vec<AnnotationSpan> = obj
        .get("spans")
        .and_then(Value::as_array)
        .map(|spans| {
            spans
                .iter()
                .filter_map(Value::as_object)
                .filter_map(parse_annotation_span)
                .collect()
        })
        .unwrap_or_default();
    if spans.is_empty() {
        return Err("no valid spans");
    }
    Ok(ManifestAnnotation {
        annotation_type,
        spans,
        color: string(obj, "color"),
        opacity: number(obj, "opacity").filter(|o| (0.0..=1.0).contains(o)),
        id: id_value(obj, "id"),
        annotated_text: string(obj, "annotatedText"),
        linked_text_id: string_of(obj, &["linkedTextItemId", "linkedTextId"]),
        meta: EntryMeta::read(obj),
    })
}

fn parse_annotation_span(obj: &Map<String, Value>) -> Option<AnnotationSpan> {
    Some(AnnotationSpan {
        x_norm: number(obj, "xNorm")?,
        y_norm_top: number(obj, "yNormTop")?,
        width_norm: number(obj, "widthNorm")?,
        height_norm: number(obj, "heightNorm")?,
        relative_x_norm: number(obj, "relativeXNorm"),
        relative_y_norm: number(obj, "relativeYNorm"),
        text: string(obj, "text"),
        font_size: number(obj, "fontSize"),
        ascent_ratio: number(obj, "ascentRatio"),
        descent_ratio: number(obj, "descentRatio"),
    })
}

fn inline_data(value: &Value) -> Option<InlineData> {
    match value {
        Value::String(s) if is_data_uri(s) => {
            DataUri::parse(s).map(|_| InlineData::DataUri(s.trim().to_string()))
        }
        Value::String(s) => decode_base64(s).map(InlineData::Bytes),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            bytes.filter(|b| !b.is_empty()).map(InlineData::Bytes)
        }
        _ => None,
    }
}

/// Finite number from a JSON number or a numeric string.
fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match obj.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn number_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number(obj, key))
}

fn pixels(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    number_of(obj, keys)
        .filter(|v| *v >= 1.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32)
}

fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)?.as_str().map(str::to_string)
}

fn string_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| string(obj, key))
}

/// Strings as-is; numbers and booleans stringified.
fn text_value(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ids may be strings or integers.
fn id_value(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn boolean(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}
