//! Flat, page-relative drawable items consumed by the layout editor.
//!
//! Every variant carries an [`ItemCommon`] with the page index, the
//! top-left anchored normalized position and the paint order. Items
//! serialize as JSON objects tagged by `"type"` with camelCase keys.

use serde::{Deserialize, Serialize};

/// Fields shared by every item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCommon {
    /// 0-based page index.
    pub page_index: usize,
    /// Left edge as a fraction of page width. Not clamped.
    pub x_norm: f64,
    /// Top edge as a fraction of page height, measured from the top. Not clamped.
    pub y_norm_top: f64,
    /// Paint order within the page; lower paints first.
    pub z_order: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ItemCommon {
    pub fn new(page_index: usize, x_norm: f64, y_norm_top: f64, z_order: f64) -> Self {
        Self {
            page_index,
            x_norm,
            y_norm_top,
            z_order,
            visible: None,
            locked: None,
            name: None,
        }
    }
}

/// Vertical anchor of text placement. Always the visual top of the glyphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    #[default]
    Top,
}

/// A visible run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_padding: Option<f64>,
    /// Identifier that annotations may link to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub anchor: Anchor,
}

/// Hit-testing geometry for a text run. Never rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpanItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub text: String,
    pub width_norm: f64,
    pub height_norm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascent_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descent_ratio: Option<f64>,
    #[serde(default)]
    pub anchor: Anchor,
}

/// A raster image with self-contained (or opaque) pixel content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub width_norm: f64,
    pub height_norm: f64,
    /// Usually a `data:` URI; an opaque reference when nothing could be decoded.
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_height: Option<u32>,
}

/// A painted path rendered as a standalone SVG scoped to its own box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub width_norm: f64,
    pub height_norm: f64,
    /// `data:image/svg+xml;base64,…`
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Line,
    Arrow,
    Triangle,
    Diamond,
    Freehand,
}

impl ShapeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rectangle" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            "line" => Some(Self::Line),
            "arrow" => Some(Self::Arrow),
            "triangle" => Some(Self::Triangle),
            "diamond" => Some(Self::Diamond),
            "freehand" => Some(Self::Freehand),
            _ => None,
        }
    }
}

/// A point of a freehand shape, relative to the shape's own box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapePoint {
    pub x: f64,
    pub y: f64,
}

/// An editor-native shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub shape_type: ShapeType,
    pub width_norm: f64,
    pub height_norm: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<ShapePoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    TextInput,
    Textarea,
    Checkbox,
    Radio,
    Dropdown,
}

impl FieldType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "textInput" => Some(Self::TextInput),
            "textarea" => Some(Self::Textarea),
            "checkbox" => Some(Self::Checkbox),
            "radio" => Some(Self::Radio),
            "dropdown" => Some(Self::Dropdown),
            _ => None,
        }
    }

    /// Fields whose value is chosen from `options`.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Radio | Self::Dropdown)
    }
}

/// An interactive form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub field_type: FieldType,
    pub field_name: String,
    pub width_norm: f64,
    pub height_norm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub font_size: f64,
    pub font_family: String,
    pub text_color: String,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Highlight,
    Strikethrough,
    Underline,
}

impl AnnotationType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "highlight" => Some(Self::Highlight),
            "strikethrough" => Some(Self::Strikethrough),
            "underline" => Some(Self::Underline),
            _ => None,
        }
    }

    /// Default `(color, opacity)` for the annotation type.
    pub fn default_style(&self) -> (&'static str, f64) {
        match self {
            Self::Highlight => ("#FFFF00", 0.4),
            Self::Strikethrough => ("#FF0000", 1.0),
            Self::Underline => ("#0000FF", 1.0),
        }
    }
}

/// One rectangle of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSpan {
    pub x_norm: f64,
    pub y_norm_top: f64,
    pub width_norm: f64,
    pub height_norm: f64,
    /// Offset from the linked text item, for spans that move with it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_x_norm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_y_norm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascent_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descent_ratio: Option<f64>,
}

/// A highlight, strikethrough or underline over one or more spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationItem {
    #[serde(flatten)]
    pub common: ItemCommon,
    pub annotation_type: AnnotationType,
    pub spans: Vec<AnnotationSpan>,
    pub color: String,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_text: Option<String>,
    /// `id` of the text item this annotation follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_text_id: Option<String>,
}

/// A drawable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Item {
    Text(TextItem),
    TextSpan(TextSpanItem),
    Image(ImageItem),
    Vector(VectorItem),
    Shape(ShapeItem),
    FormField(FormFieldItem),
    Annotation(AnnotationItem),
}

/// Discriminant of [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Text,
    TextSpan,
    Image,
    Vector,
    Shape,
    FormField,
    Annotation,
}

impl Item {
    pub fn common(&self) -> &ItemCommon {
        match self {
            Item::Text(i) => &i.common,
            Item::TextSpan(i) => &i.common,
            Item::Image(i) => &i.common,
            Item::Vector(i) => &i.common,
            Item::Shape(i) => &i.common,
            Item::FormField(i) => &i.common,
            Item::Annotation(i) => &i.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ItemCommon {
        match self {
            Item::Text(i) => &mut i.common,
            Item::TextSpan(i) => &mut i.common,
            Item::Image(i) => &mut i.common,
            Item::Vector(i) => &mut i.common,
            Item::Shape(i) => &mut i.common,
            Item::FormField(i) => &mut i.common,
            Item::Annotation(i) => &mut i.common,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Text(_) => ItemKind::Text,
            Item::TextSpan(_) => ItemKind::TextSpan,
            Item::Image(_) => ItemKind::Image,
            Item::Vector(_) => ItemKind::Vector,
            Item::Shape(_) => ItemKind::Shape,
            Item::FormField(_) => ItemKind::FormField,
            Item::Annotation(_) => ItemKind::Annotation,
        }
    }

    pub fn page_index(&self) -> usize {
        self.common().page_index
    }

    pub fn z_order(&self) -> f64 {
        self.common().z_order
    }

    pub fn set_z_order(&mut self, z_order: f64) {
        self.common_mut().z_order = z_order;
    }
}

/// Width and height reported alongside the item list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}
