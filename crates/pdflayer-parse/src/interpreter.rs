//! Content stream interpreter.
//!
//! Walks tokenized operators while tracking the graphics state, the text
//! state and the current path, and reports glyphs, painted paths and
//! placed images to a [`ContentHandler`] in page space. Form XObjects
//! are interpreted recursively up to `max_form_depth`.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::{Dictionary, Document};
use pdflayer_core::{
    BBox, Color, Ctm, ExtractOptions, ExtractWarning, ExtractWarningCode, FillRule, PaintRequest,
    PathBuilder, Point,
};
use tracing::{debug, trace};

use crate::error::BackendError;
use crate::fonts::LoadedFont;
use crate::handler::{ContentHandler, GlyphEvent, ImageEvent, PathEvent};
use crate::images::extract_image_payload;
use crate::objects::{decode_stream, get, get_dict, get_number, matrix_from_array};
use crate::tokenizer::{Operand, Operator, tokenize_partial};

/// Text state parameters. Saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextParams {
    font: Option<Rc<LoadedFont>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// `Tz / 100`.
    h_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Ctm,
    fill_color: Color,
    stroke_color: Color,
    line_width: f64,
    fill_alpha: Option<f64>,
    stroke_alpha: Option<f64>,
    text: TextParams,
}

impl GraphicsState {
    fn new(ctm: Ctm) -> Self {
        Self {
            ctm,
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
            fill_alpha: None,
            stroke_alpha: None,
            text: TextParams::default(),
        }
    }
}

/// Interpret a page content stream.
///
/// Returns `Err` only when the stream is structurally damaged; the
/// operators before the damage are still interpreted and reported.
pub fn interpret_content(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
) -> Result<(), BackendError> {
    let mut interpreter = Interpreter {
        doc,
        options,
        handler,
        gs: GraphicsState::new(Ctm::identity()),
        saved: Vec::new(),
        tm: Ctm::identity(),
        tlm: Ctm::identity(),
        path: PathBuilder::new(Ctm::identity()),
    };
    interpreter.run(content, resources, 0)
}

struct Interpreter<'a, 'h> {
    doc: &'a Document,
    options: &'a ExtractOptions,
    handler: &'h mut dyn ContentHandler,
    gs: GraphicsState,
    saved: Vec<GraphicsState>,
    /// Text matrix.
    tm: Ctm,
    /// Text line matrix.
    tlm: Ctm,
    path: PathBuilder,
}

impl<'a> Interpreter<'a, '_> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &'a Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        let (ops, damage) = tokenize_partial(content);
        let mut fonts: HashMap<String, Rc<LoadedFont>> = HashMap::new();
        for op in &ops {
            self.apply(op, resources, &mut fonts, depth);
        }
        match damage {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply(
        &mut self,
        op: &Operator,
        resources: &'a Dictionary,
        fonts: &mut HashMap<String, Rc<LoadedFont>>,
        depth: usize,
    ) {
        match op.name.as_str() {
            // graphics state
            "q" => self.saved.push(self.gs.clone()),
            "Q" => {
                if let Some(gs) = self.saved.pop() {
                    self.gs = gs;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.gs.ctm = Ctm::from_array(m).concat(&self.gs.ctm);
                }
            }
            "w" => {
                if let Some(w) = op.number(0) {
                    self.gs.line_width = w;
                }
            }
            "gs" => {
                if let Some(name) = op.operands.first().and_then(Operand::as_name) {
                    self.apply_ext_gstate(resources, name);
                }
            }

            // color
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(c) = Color::from_components(&op.all_numbers()) {
                    self.gs.fill_color = c;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(c) = Color::from_components(&op.all_numbers()) {
                    self.gs.stroke_color = c;
                }
            }
            // device spaces start at black
            "cs" => self.gs.fill_color = Color::black(),
            "CS" => self.gs.stroke_color = Color::black(),

            // text objects and positioning
            "BT" => {
                self.tm = Ctm::identity();
                self.tlm = Ctm::identity();
            }
            "ET" => {}
            "Tf" => {
                if let (Some(name), Some(size)) =
                    (op.operands.first().and_then(Operand::as_name), op.number(1))
                {
                    self.gs.text.font = Some(self.font(resources, fonts, name));
                    self.gs.text.size = size;
                }
            }
            "Tc" => self.set_text_param(op, |t, v| t.char_spacing = v),
            "Tw" => self.set_text_param(op, |t, v| t.word_spacing = v),
            "Tz" => self.set_text_param(op, |t, v| t.h_scale = v / 100.0),
            "TL" => self.set_text_param(op, |t, v| t.leading = v),
            "Ts" => self.set_text_param(op, |t, v| t.rise = v),
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.gs.text.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.tm = Ctm::from_array(m);
                    self.tlm = self.tm;
                }
            }
            "T*" => self.next_line(0.0, -self.gs.text.leading),

            // text showing
            "Tj" => {
                if let Some(bytes) = op.operands.first().and_then(Operand::as_bytes) {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line(0.0, -self.gs.text.leading);
                if let Some(bytes) = op.operands.first().and_then(Operand::as_bytes) {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                    self.gs.text.word_spacing = aw;
                    self.gs.text.char_spacing = ac;
                }
                self.next_line(0.0, -self.gs.text.leading);
                if let Some(bytes) = op.operands.get(2).and_then(Operand::as_bytes) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Operand::LiteralString(b) | Operand::HexString(b) => self.show(b),
                            _ => {
                                if let Some(adjust) = item.as_f64() {
                                    let t = &self.gs.text;
                                    let tx = -adjust / 1000.0 * t.size * t.h_scale;
                                    self.tm = Ctm::translation(tx, 0.0).concat(&self.tm);
                                }
                            }
                        }
                    }
                }
            }

            // path construction
            "m" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.move_to(x, y);
                }
            }
            "l" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.line_to(x, y);
                }
            }
            "c" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = op.numbers::<6>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.curve_to(x1, y1, x2, y2, x3, y3);
                }
            }
            "v" => {
                if let Some([x2, y2, x3, y3]) = op.numbers::<4>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.curve_to_v(x2, y2, x3, y3);
                }
            }
            "y" => {
                if let Some([x1, y1, x3, y3]) = op.numbers::<4>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.curve_to_y(x1, y1, x3, y3);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = op.numbers::<4>() {
                    self.path.set_ctm(self.gs.ctm);
                    self.path.rectangle(x, y, w, h);
                }
            }
            "h" => self.path.close_path(),

            // path painting
            "S" => self.paint(true, false, false, FillRule::NonZeroWinding),
            "s" => self.paint(true, false, true, FillRule::NonZeroWinding),
            "f" | "F" => self.paint(false, true, false, FillRule::NonZeroWinding),
            "f*" => self.paint(false, true, false, FillRule::EvenOdd),
            "B" => self.paint(true, true, false, FillRule::NonZeroWinding),
            "B*" => self.paint(true, true, false, FillRule::EvenOdd),
            "b" => self.paint(true, true, true, FillRule::NonZeroWinding),
            "b*" => self.paint(true, true, true, FillRule::EvenOdd),
            "n" => {
                self.path.take_path();
            }

            "Do" => {
                if let Some(name) = op.operands.first().and_then(Operand::as_name) {
                    self.do_xobject(resources, name, depth);
                }
            }

            // clipping, marked content, line style and the rest
            _ => {}
        }
    }

    fn set_text_param(&mut self, op: &Operator, set: impl FnOnce(&mut TextParams, f64)) {
        if let Some(v) = op.number(0) {
            set(&mut self.gs.text, v);
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Ctm::translation(tx, ty).concat(&self.tlm);
        self.tm = self.tlm;
    }

    fn font(
        &mut self,
        resources: &'a Dictionary,
        fonts: &mut HashMap<String, Rc<LoadedFont>>,
        name: &str,
    ) -> Rc<LoadedFont> {
        if let Some(font) = fonts.get(name) {
            return Rc::clone(font);
        }
        let loaded = match get_dict(self.doc, resources, b"Font")
            .and_then(|fonts| get_dict(self.doc, fonts, name.as_bytes()))
        {
            Some(dict) => LoadedFont::load(self.doc, dict, name),
            None => {
                debug!(font = name, "font resource not found, using default metrics");
                LoadedFont::fallback(name)
            }
        };
        let font = Rc::new(loaded);
        fonts.insert(name.to_string(), Rc::clone(&font));
        font
    }

    fn show(&mut self, bytes: &[u8]) {
        let Some(font) = self.gs.text.font.clone() else {
            trace!("text shown without a font");
            return;
        };
        let t = self.gs.text.clone();
        for glyph in font.decode(bytes) {
            let render = self.tm.concat(&self.gs.ctm);
            let trm = Ctm::new(t.size * t.h_scale, 0.0, 0.0, t.size, 0.0, t.rise).concat(&render);
            let origin = trm.transform_point(Point::new(0.0, 0.0));
            let (sx, sy) = render.transform_vector(0.0, t.size);
            let glyph_width = glyph.width / 1000.0 * t.size * t.h_scale;
            let (ax, ay) = render.transform_vector(glyph_width, 0.0);

            self.handler.on_glyph(GlyphEvent {
                text: glyph.text,
                font_name: font.base_name.clone(),
                font_size: sx.hypot(sy),
                origin,
                advance: ax.hypot(ay),
                color: self.gs.fill_color,
                ascent: font.ascent,
                descent: font.descent,
            });

            let spacing = t.char_spacing + if glyph.is_word_space { t.word_spacing } else { 0.0 };
            let tx = glyph_width + spacing * t.h_scale;
            self.tm = Ctm::translation(tx, 0.0).concat(&self.tm);
        }
    }

    fn paint(&mut self, stroke: bool, fill: bool, close: bool, fill_rule: FillRule) {
        if close {
            self.path.close_path();
        }
        let path = self.path.take_path();
        if path.is_empty() {
            return;
        }
        let request = PaintRequest {
            stroke_color: stroke.then_some(self.gs.stroke_color),
            fill_color: fill.then_some(self.gs.fill_color),
            line_width: self.gs.line_width * self.gs.ctm.scale(),
            fill_opacity: self.gs.fill_alpha,
            stroke_opacity: self.gs.stroke_alpha,
            fill_rule,
            closed_primitive: path.is_closed_primitive(),
        };
        self.handler.on_path(PathEvent { path, request });
    }

    fn apply_ext_gstate(&mut self, resources: &Dictionary, name: &str) {
        let Some(ext) = get_dict(self.doc, resources, b"ExtGState")
            .and_then(|states| get_dict(self.doc, states, name.as_bytes()))
        else {
            debug!(name, "ExtGState not found");
            return;
        };
        if let Some(lw) = get_number(self.doc, ext, b"LW") {
            self.gs.line_width = lw;
        }
        if let Some(ca) = get_number(self.doc, ext, b"ca") {
            self.gs.fill_alpha = Some(ca.clamp(0.0, 1.0));
        }
        if let Some(ca) = get_number(self.doc, ext, b"CA") {
            self.gs.stroke_alpha = Some(ca.clamp(0.0, 1.0));
        }
    }

    fn do_xobject(&mut self, resources: &'a Dictionary, name: &str, depth: usize) {
        let Some(stream) = get_dict(self.doc, resources, b"XObject")
            .and_then(|xobjects| get(self.doc, xobjects, name.as_bytes()))
            .and_then(|obj| obj.as_stream().ok())
        else {
            debug!(name, "XObject not found");
            return;
        };
        let subtype = get(self.doc, &stream.dict, b"Subtype").and_then(|o| o.as_name().ok());
        match subtype {
            Some(b"Image") => {
                let doc = self.doc;
                let ctm = self.gs.ctm;
                let dim = |key: &[u8]| {
                    get_number(doc, &stream.dict, key)
                        .map(|v| v.max(0.0) as u32)
                        .unwrap_or(0)
                };
                let event = ImageEvent {
                    name: name.to_string(),
                    bbox: BBox::new(0.0, 0.0, 1.0, 1.0).transformed(&ctm),
                    origin: ctm.transform_point(Point::new(0.0, 0.0)),
                    pixel_width: dim(b"Width"),
                    pixel_height: dim(b"Height"),
                    payload: extract_image_payload(doc, stream),
                };
                self.handler.on_image(event);
            }
            Some(b"Form") => {
                if depth + 1 > self.options.max_form_depth {
                    self.handler.on_warning(ExtractWarning::new(
                        ExtractWarningCode::PageInterpretationFailed,
                        format!(
                            "form XObject /{name} nested deeper than {}",
                            self.options.max_form_depth
                        ),
                    ));
                    return;
                }
                let content = match decode_stream(stream) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        self.handler.on_warning(ExtractWarning::new(
                            ExtractWarningCode::PageInterpretationFailed,
                            format!("form XObject /{name}: {e}"),
                        ));
                        return;
                    }
                };
                let form_resources =
                    get_dict(self.doc, &stream.dict, b"Resources").unwrap_or(resources);

                self.saved.push(self.gs.clone());
                if let Some(m) = get(self.doc, &stream.dict, b"Matrix")
                    .and_then(|o| o.as_array().ok())
                    .and_then(|arr| matrix_from_array(self.doc, arr))
                {
                    self.gs.ctm = Ctm::from_array(m).concat(&self.gs.ctm);
                }
                let (tm, tlm) = (self.tm, self.tlm);
                if let Err(e) = self.run(&content, form_resources, depth + 1) {
                    self.handler.on_warning(ExtractWarning::new(
                        ExtractWarningCode::PageInterpretationFailed,
                        format!("form XObject /{name}: {e}"),
                    ));
                }
                self.tm = tm;
                self.tlm = tlm;
                if let Some(gs) = self.saved.pop() {
                    self.gs = gs;
                }
            }
            _ => {}
        }
    }
}
