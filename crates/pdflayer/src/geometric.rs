//! Geometric extraction of one page.
//!
//! The page's content is interpreted once; the recorded glyphs, images
//! and paths are then turned into items by three passes (text, images,
//! vectors) in that order. Every item starts with its emission index as
//! `z_order` and carries a page-space anchor that paint-order
//! reconstruction uses to move it to the operation that drew it.

use pdflayer_core::{
    BBox, ExtractOptions, ExtractWarning, ExtractWarningCode, ImageItem, Item, ItemCommon,
    ItemKind, PaintStyle, Point, VectorItem, normalize, render_vector_fragment,
};
use pdflayer_parse::{
    ContentHandler, GlyphEvent, ImageEvent, ImagePayload, LopdfBackend, LopdfPage, PaintKind,
    PathEvent, PdfBackend, match_paint_order, reconstruct_paint_ops,
};
use tracing::{debug, info_span, warn};

use crate::pdf::Pdf;
use crate::rasterizer::rasterize_page;
use crate::text_runs::group_runs;

/// Interpretation events of one page; warnings are tagged with the page.
struct PageCollector {
    page_index: usize,
    glyphs: Vec<GlyphEvent>,
    paths: Vec<PathEvent>,
    images: Vec<ImageEvent>,
    warnings: Vec<ExtractWarning>,
}

impl PageCollector {
    fn new(page_index: usize) -> Self {
        Self {
            page_index,
            glyphs: Vec::new(),
            paths: Vec::new(),
            images: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ContentHandler for PageCollector {
    fn on_glyph(&mut self, event: GlyphEvent) {
        self.glyphs.push(event);
    }

    fn on_path(&mut self, event: PathEvent) {
        self.paths.push(event);
    }

    fn on_image(&mut self, event: ImageEvent) {
        self.images.push(event);
    }

    fn on_warning(&mut self, mut warning: ExtractWarning) {
        if warning.page.is_none() {
            warning.page = Some(self.page_index);
        }
        self.warnings.push(warning);
    }
}

/// An item and where on the page its drawing operation happened.
struct Anchored {
    item: Item,
    anchor: Option<(PaintKind, Point)>,
}

/// Items and warnings of one page.
pub(crate) struct PageExtraction {
    pub items: Vec<Item>,
    pub warnings: Vec<ExtractWarning>,
}

pub(crate) fn extract_page(pdf: &Pdf, page_index: usize) -> PageExtraction {
    let _span = info_span!("page", index = page_index).entered();
    let options = pdf.options();
    let page_box = pdf.page_box(page_index);
    let mut warnings = Vec::new();

    if page_box.width() <= 0.0 || page_box.height() <= 0.0 {
        warn!(page = page_index, "skipping page without area");
        warnings.push(ExtractWarning::on_page(
            ExtractWarningCode::DegeneratePage,
            format!(
                "page box is {} x {}",
                page_box.width(),
                page_box.height()
            ),
            page_index,
        ));
        return PageExtraction {
            items: Vec::new(),
            warnings,
        };
    }

    let doc = pdf.document();
    let page = match LopdfBackend::get_page(doc, page_index) {
        Ok(page) => page,
        Err(e) => {
            warnings.push(ExtractWarning::on_page(
                ExtractWarningCode::PageInterpretationFailed,
                e.to_string(),
                page_index,
            ));
            return PageExtraction {
                items: Vec::new(),
                warnings,
            };
        }
    };

    let mut collector = PageCollector::new(page_index);
    if let Err(e) = LopdfBackend::interpret_page(doc, &page, &mut collector, options) {
        warn!(page = page_index, error = %e, "content stream interpretation stopped early");
        collector.warnings.push(ExtractWarning::on_page(
            ExtractWarningCode::PageInterpretationFailed,
            e.to_string(),
            page_index,
        ));
    }

    let mut anchored = Vec::new();
    text_pass(&collector.glyphs, page_index, &page_box, options, &mut anchored);
    image_pass(
        &collector.images,
        page_index,
        &page_box,
        &mut anchored,
        &mut collector.warnings,
    );
    vector_pass(&collector.paths, page_index, &page_box, options, &mut anchored);
    for (index, entry) in anchored.iter_mut().enumerate() {
        entry.item.set_z_order(index as f64);
    }
    warnings.append(&mut collector.warnings);

    if options.legacy_rasterizer.is_some() {
        legacy_vectors(pdf, page_index, &mut anchored, &mut warnings);
    }
    if options.paint_order.enabled {
        apply_paint_order(pdf, &page, &mut anchored, &mut warnings);
    }

    debug!(page = page_index, items = anchored.len(), "page extracted");
    PageExtraction {
        items: anchored.into_iter().map(|a| a.item).collect(),
        warnings,
    }
}

fn text_pass(
    glyphs: &[GlyphEvent],
    page_index: usize,
    page_box: &BBox,
    options: &ExtractOptions,
    out: &mut Vec<Anchored>,
) {
    for run in group_runs(glyphs, options.font_size_tolerance) {
        let Some(items) = run.to_items(page_index, page_box, 0.0, options) else {
            continue;
        };
        for item in items {
            out.push(Anchored {
                item,
                anchor: Some((PaintKind::Text, run.anchor)),
            });
        }
    }
}

fn image_pass(
    images: &[ImageEvent],
    page_index: usize,
    page_box: &BBox,
    out: &mut Vec<Anchored>,
    warnings: &mut Vec<ExtractWarning>,
) {
    for image in images {
        let reference = match &image.payload {
            ImagePayload::Encoded { .. } => image.payload.data_uri(),
            ImagePayload::Unsupported(reason) => {
                debug!(name = %image.name, %reason, "skipping image");
                warnings.push(ExtractWarning::on_page(
                    ExtractWarningCode::UnsupportedImageEncoding,
                    format!("{}: {reason}", image.name),
                    page_index,
                ));
                None
            }
            ImagePayload::Failed(reason) => {
                debug!(name = %image.name, %reason, "image decode failed");
                warnings.push(ExtractWarning::on_page(
                    ExtractWarningCode::ImageDecodeFailed,
                    format!("{}: {reason}", image.name),
                    page_index,
                ));
                None
            }
        };
        let (Some(reference), Some(placement)) = (reference, normalize(page_box, &image.bbox))
        else {
            continue;
        };
        let mut common = ItemCommon::new(page_index, placement.x_norm, placement.y_norm_top, 0.0);
        common.name = Some(image.name.clone());
        out.push(Anchored {
            item: Item::Image(ImageItem {
                common,
                width_norm: placement.width_norm,
                height_norm: placement.height_norm,
                reference,
                pixel_width: (image.pixel_width > 0).then_some(image.pixel_width),
                pixel_height: (image.pixel_height > 0).then_some(image.pixel_height),
            }),
            anchor: Some((PaintKind::Image, image.origin)),
        });
    }
}

fn vector_pass(
    paths: &[PathEvent],
    page_index: usize,
    page_box: &BBox,
    options: &ExtractOptions,
    out: &mut Vec<Anchored>,
) {
    for event in paths {
        let style = PaintStyle::resolve(&event.request);
        if style.is_invisible() {
            debug!("skipping path with neither fill nor stroke");
            continue;
        }
        if style.is_background_artifact(options.white_threshold) {
            debug!("skipping near-white background fill");
            continue;
        }
        let Some(fragment) = render_vector_fragment(&event.path, &style) else {
            continue;
        };
        let Some(placement) = normalize(page_box, &fragment.bbox) else {
            continue;
        };
        out.push(Anchored {
            item: Item::Vector(VectorItem {
                common: ItemCommon::new(page_index, placement.x_norm, placement.y_norm_top, 0.0),
                width_norm: placement.width_norm,
                height_norm: placement.height_norm,
                data: fragment.data_uri(),
            }),
            anchor: event.path.first_point().map(|p| (PaintKind::Path, p)),
        });
    }
}

/// Replace the page's vectors with one full-page fragment from the
/// external rasterizer. On any failure the primitive vectors stay.
fn legacy_vectors(
    pdf: &Pdf,
    page_index: usize,
    anchored: &mut Vec<Anchored>,
    warnings: &mut Vec<ExtractWarning>,
) {
    let Some(config) = &pdf.options().legacy_rasterizer else {
        return;
    };
    let unavailable = |warnings: &mut Vec<ExtractWarning>, reason: String| {
        warn!(page = page_index, %reason, "legacy rasterizer unavailable");
        warnings.push(ExtractWarning::on_page(
            ExtractWarningCode::RasterizerUnavailable,
            reason,
            page_index,
        ));
    };
    let Some(source) = pdf.source_path() else {
        unavailable(warnings, "document was not opened from a file".to_string());
        return;
    };
    match rasterize_page(config, source, page_index) {
        Ok(svg) => {
            anchored.retain(|a| a.item.kind() != ItemKind::Vector);
            anchored.push(Anchored {
                item: Item::Vector(VectorItem {
                    common: ItemCommon::new(page_index, 0.0, 0.0, -1.0),
                    width_norm: 1.0,
                    height_norm: 1.0,
                    data: pdflayer_core::encode_data_uri("image/svg+xml", svg.as_bytes()),
                }),
                anchor: None,
            });
        }
        Err(e) => unavailable(warnings, e.to_string()),
    }
}

fn apply_paint_order(
    pdf: &Pdf,
    page: &LopdfPage,
    anchored: &mut [Anchored],
    warnings: &mut Vec<ExtractWarning>,
) {
    let page_index = page.index;
    let ops = LopdfBackend::page_content(pdf.document(), page)
        .and_then(|content| reconstruct_paint_ops(&content));
    let ops = match ops {
        Ok(ops) => ops,
        Err(e) => {
            warn!(page = page_index, error = %e, "keeping emission order");
            warnings.push(ExtractWarning::on_page(
                ExtractWarningCode::PaintOrderUnavailable,
                e.to_string(),
                page_index,
            ));
            return;
        }
    };

    let (positions, anchors): (Vec<usize>, Vec<(PaintKind, Point)>) = anchored
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.anchor.map(|anchor| (i, anchor)))
        .unzip();
    let matched = match_paint_order(&ops, &anchors, &pdf.options().paint_order);
    let mut adopted = 0usize;
    for (position, seq) in positions.into_iter().zip(matched) {
        if let Some(seq) = seq {
            anchored[position].item.set_z_order(seq as f64);
            adopted += 1;
        }
    }
    debug!(page = page_index, ops = ops.len(), adopted, "paint order applied");
}
