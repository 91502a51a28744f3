//! Expansion of a validated manifest into the flat item list.

use crate::data_uri::{encode_data_uri, sniff_mime};
use crate::error::{ExtractWarning, ExtractWarningCode};
use crate::item::{
    Anchor, AnnotationItem, FieldType, FormFieldItem, ImageItem, Item, ItemCommon, PageDimensions,
    ShapeItem, ShapeType, TextItem, TextSpanItem,
};
use crate::manifest::{EntryMeta, InlineData, Manifest, ManifestImage, ManifestPage};
use crate::options::ExtractOptions;

/// Output of [`flatten_manifest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub items: Vec<Item>,
    pub page_dimensions: PageDimensions,
    pub warnings: Vec<ExtractWarning>,
}

/// Expand `manifest` into items.
///
/// `page_count` bounds the page indices that may be emitted and
/// `document_page` supplies dimensions when the manifest has no
/// `pageSize`. Items without an explicit `zIndex` get their category's
/// default band from `options.z_bands`.
pub fn flatten_manifest(
    manifest: &Manifest,
    page_count: usize,
    document_page: PageDimensions,
    options: &ExtractOptions,
) -> Flattened {
    let page_dimensions = manifest.page_size.unwrap_or(document_page);
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    for (page_index, page) in manifest.pages.iter().enumerate() {
        if page_index >= page_count {
            warnings.push(ExtractWarning::on_page(
                ExtractWarningCode::ManifestPageOutOfRange,
                format!("manifest page {page_index} but document has {page_count} pages"),
                page_index,
            ));
            continue;
        }
        for reason in &page.rejected {
            warnings.push(ExtractWarning::on_page(
                ExtractWarningCode::MalformedManifestEntry,
                reason.clone(),
                page_index,
            ));
        }
        let mut flattener = PageFlattener {
            page_index,
            page: page_dimensions,
            options,
            items: &mut items,
            warnings: &mut warnings,
        };
        flattener.run(page);
    }

    Flattened {
        items,
        page_dimensions,
        warnings,
    }
}

struct PageFlattener<'a> {
    page_index: usize,
    page: PageDimensions,
    options: &'a ExtractOptions,
    items: &'a mut Vec<Item>,
    warnings: &'a mut Vec<ExtractWarning>,
}

impl PageFlattener<'_> {
    fn run(&mut self, page: &ManifestPage) {
        for (i, image) in page.images.iter().enumerate() {
            self.image(i, image);
        }
        self.shapes(page);
        self.annotations(page);
        self.texts(page);
        self.form_fields(page);
        self.text_spans(page);
    }

    fn common(&self, x_norm: f64, y_norm_top: f64, meta: &EntryMeta, band: f64) -> ItemCommon {
        ItemCommon {
            page_index: self.page_index,
            x_norm,
            y_norm_top,
            z_order: meta.z_index.unwrap_or(band),
            visible: meta.visible,
            locked: meta.locked,
            name: meta.name.clone(),
        }
    }

    fn image(&mut self, index: usize, image: &ManifestImage) {
        let Some(reference) = resolve_image_ref(image) else {
            self.warnings.push(ExtractWarning::on_page(
                ExtractWarningCode::MalformedManifestEntry,
                format!("images[{index}]: no usable reference or payload"),
                self.page_index,
            ));
            return;
        };
        let width_norm = image
            .width_norm
            .or_else(|| image.pixel_width.map(|w| f64::from(w) / self.page.width))
            .unwrap_or(0.0);
        let height_norm = image
            .height_norm
            .or_else(|| image.pixel_height.map(|h| f64::from(h) / self.page.height))
            .unwrap_or(0.0);
        let common = self.common(
            image.x_norm,
            image.y_norm_top,
            &image.meta,
            self.options.z_bands.image,
        );
        self.items.push(Item::Image(ImageItem {
            common,
            width_norm,
            height_norm,
            reference,
            pixel_width: image.pixel_width,
            pixel_height: image.pixel_height,
        }));
    }

    fn shapes(&mut self, page: &ManifestPage) {
        for shape in &page.shapes {
            let common = self.common(
                shape.x_norm,
                shape.y_norm_top,
                &shape.meta,
                self.options.z_bands.shape,
            );
            let points = if shape.shape_type == ShapeType::Freehand {
                shape.points.clone()
            } else {
                None
            };
            self.items.push(Item::Shape(ShapeItem {
                common,
                shape_type: shape.shape_type,
                width_norm: shape.width_norm,
                height_norm: shape.height_norm,
                stroke_color: shape
                    .stroke_color
                    .clone()
                    .unwrap_or_else(|| "#000000".to_string()),
                stroke_width: shape.stroke_width.unwrap_or(2.0),
                fill_color: shape.fill_color.clone(),
                points,
            }));
        }
    }

    fn annotations(&mut self, page: &ManifestPage) {
        for annotation in &page.annotations {
            // validated manifests never carry an annotation without spans
            let Some(first) = annotation.spans.first() else {
                continue;
            };
            let (default_color, default_opacity) = annotation.annotation_type.default_style();
            let common = self.common(
                first.x_norm,
                first.y_norm_top,
                &annotation.meta,
                self.options.z_bands.annotation,
            );
            self.items.push(Item::Annotation(AnnotationItem {
                common,
                annotation_type: annotation.annotation_type,
                spans: annotation.spans.clone(),
                color: annotation
                    .color
                    .clone()
                    .unwrap_or_else(|| default_color.to_string()),
                opacity: annotation.opacity.unwrap_or(default_opacity),
                id: annotation.id.clone(),
                annotated_text: annotation.annotated_text.clone(),
                linked_text_id: annotation.linked_text_id.clone(),
            }));
        }
    }

    fn texts(&mut self, page: &ManifestPage) {
        for text in &page.texts {
            let common = self.common(
                text.x_norm,
                text.y_norm_top,
                &text.meta,
                self.options.z_bands.text,
            );
            self.items.push(Item::Text(TextItem {
                common,
                text: text.text.clone(),
                font_size: text.font_size,
                font_family: text.font_family.clone(),
                color: text.color.clone(),
                box_padding: text
                    .box_padding
                    .or_else(|| text.font_size.map(|s| (s * 0.2).round())),
                id: text.id.clone(),
                anchor: Anchor::Top,
            }));
        }
    }

    fn form_fields(&mut self, page: &ManifestPage) {
        for (i, field) in page.form_fields.iter().enumerate() {
            let common = self.common(
                field.x_norm,
                field.y_norm_top,
                &field.meta,
                self.options.z_bands.form_field,
            );
            let field_name = field
                .field_name
                .clone()
                .or_else(|| field.meta.name.clone())
                .unwrap_or_else(|| format!("field_{}_{}", self.page_index + 1, i + 1));
            let options = if field.field_type.is_choice() {
                field.options.clone()
            } else {
                None
            };
            let group_name = if field.field_type == FieldType::Radio {
                field.group_name.clone()
            } else {
                None
            };
            self.items.push(Item::FormField(FormFieldItem {
                common,
                field_type: field.field_type,
                field_name,
                width_norm: field.width_norm,
                height_norm: field.height_norm,
                label: field.label.clone(),
                placeholder: field.placeholder.clone(),
                default_value: field.default_value.clone(),
                required: field.required.unwrap_or(false),
                options,
                group_name,
                font_size: field.font_size.unwrap_or(14.0),
                font_family: field
                    .font_family
                    .clone()
                    .unwrap_or_else(|| "Arial".to_string()),
                text_color: field
                    .text_color
                    .clone()
                    .unwrap_or_else(|| "#000000".to_string()),
                background_color: field
                    .background_color
                    .clone()
                    .unwrap_or_else(|| "#ffffff".to_string()),
                border_color: field
                    .border_color
                    .clone()
                    .unwrap_or_else(|| "#374151".to_string()),
                border_width: field.border_width.unwrap_or(1.0),
            }));
        }
    }

    /// Precomputed spans are used verbatim. Without them, spans are
    /// synthesized from texts that have both text and a font size.
    fn text_spans(&mut self, page: &ManifestPage) {
        let band = self.options.z_bands.text_span;
        if !page.text_spans.is_empty() {
            for span in &page.text_spans {
                let common = self.common(span.x_norm, span.y_norm_top, &span.meta, band);
                self.items.push(Item::TextSpan(TextSpanItem {
                    common,
                    text: span.text.clone(),
                    width_norm: span.width_norm,
                    height_norm: span.height_norm,
                    font_size: span.font_size,
                    font_family: None,
                    color: None,
                    id: span.id.clone(),
                    ascent_ratio: span.ascent_ratio,
                    descent_ratio: span.descent_ratio,
                    anchor: Anchor::Top,
                }));
            }
            return;
        }

        for text in &page.texts {
            let Some(font_size) = text.font_size else {
                continue;
            };
            if text.text.is_empty() {
                continue;
            }
            let chars = text.text.chars().count() as f64;
            let common = ItemCommon {
                z_order: band,
                ..self.common(text.x_norm, text.y_norm_top, &text.meta, band)
            };
            self.items.push(Item::TextSpan(TextSpanItem {
                common,
                text: text.text.clone(),
                width_norm: chars * 0.5 * font_size / self.page.width,
                height_norm: font_size / self.page.height,
                font_size: Some(font_size),
                font_family: text.font_family.clone(),
                color: None,
                id: text.id.clone(),
                ascent_ratio: None,
                descent_ratio: None,
                anchor: Anchor::Top,
            }));
        }
    }
}

/// Pick the most self-contained reference an image entry offers.
///
/// Order: an existing `data:` reference, inline data (re-wrapped as a
/// `data:` URI), then the opaque reference string untouched.
fn resolve_image_ref(image: &ManifestImage) -> Option<String> {
    if let Some(reference) = &image.reference {
        if crate::data_uri::is_data_uri(reference) {
            return Some(reference.trim().to_string());
        }
    }
    match &image.inline {
        Some(InlineData::DataUri(uri)) => return Some(uri.clone()),
        Some(InlineData::Bytes(bytes)) => {
            let mime = sniff_mime(bytes).or_else(|| {
                image
                    .mime_type
                    .as_deref()
                    .filter(|m| m.starts_with("image/"))
            });
            if let Some(mime) = mime {
                return Some(encode_data_uri(mime, bytes));
            }
        }
        None => {}
    }
    image.reference.clone()
}
