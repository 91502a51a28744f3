//! Best-effort paint-order reconstruction.
//!
//! The page's top-level content stream is replayed with a reduced state
//! machine that only tracks where things happen: the CTM (`cm`, `q`, `Q`),
//! the text matrices (`BT`, `Td`, `TD`, `T*`, `Tm`, `TL`) and the first
//! point of the current path. Every showing, placing or painting operator
//! becomes a [`PaintOp`]. Extracted items are then matched to the nearest
//! operation of the same kind and adopt its sequence number.
//!
//! Dense pages with overlapping content can be mis-assigned; unmatched
//! items keep whatever order they already had.

use pdflayer_core::{Ctm, PaintOrderOptions, Point};

use crate::error::BackendError;
use crate::tokenizer::{Operator, tokenize};

/// What an operation draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintKind {
    Text,
    Image,
    Path,
}

/// One drawing operation in stream order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintOp {
    /// 0-based position among drawing operations.
    pub seq: usize,
    pub kind: PaintKind,
    /// Approximate page-space position.
    pub x: f64,
    pub y: f64,
}

/// Replay `content` and list its drawing operations.
///
/// # Errors
///
/// Fails when the stream cannot be tokenized at all; no partial list is
/// returned in that case.
pub fn reconstruct_paint_ops(content: &[u8]) -> Result<Vec<PaintOp>, BackendError> {
    let ops = tokenize(content)?;
    let mut replay = Replay::default();
    for op in &ops {
        replay.apply(op);
    }
    Ok(replay.out)
}

#[derive(Default)]
struct Replay {
    ctm: Ctm,
    stack: Vec<Ctm>,
    tm: Ctm,
    tlm: Ctm,
    leading: f64,
    /// First point of the current path, already in page space.
    path_start: Option<Point>,
    out: Vec<PaintOp>,
}

impl Replay {
    fn apply(&mut self, op: &Operator) {
        match op.name.as_str() {
            "q" => self.stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.ctm = Ctm::from_array(m).concat(&self.ctm);
                }
            }

            "BT" => {
                self.tm = Ctm::identity();
                self.tlm = Ctm::identity();
            }
            "TL" => {
                if let Some(tl) = op.number(0) {
                    self.leading = tl;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.leading),
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.tm = Ctm::from_array(m);
                    self.tlm = self.tm;
                }
            }

            "Tj" | "TJ" => self.emit_text(),
            "'" | "\"" => {
                self.next_line(0.0, -self.leading);
                self.emit_text();
            }

            "Do" => {
                let origin = self.ctm.transform_point(Point::new(0.0, 0.0));
                self.emit(PaintKind::Image, origin);
            }

            // `re` starts at its corner operands
            "m" | "re" => {
                if self.path_start.is_none() {
                    if let Some([x, y]) = op.numbers::<2>() {
                        self.path_start = Some(self.ctm.transform_point(Point::new(x, y)));
                    }
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                if let Some(start) = self.path_start.take() {
                    self.emit(PaintKind::Path, start);
                }
            }
            "n" => self.path_start = None,

            _ => {}
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Ctm::translation(tx, ty).concat(&self.tlm);
        self.tm = self.tlm;
    }

    fn emit_text(&mut self) {
        let origin = self.tm.concat(&self.ctm).transform_point(Point::new(0.0, 0.0));
        self.emit(PaintKind::Text, origin);
    }

    fn emit(&mut self, kind: PaintKind, at: Point) {
        let seq = self.out.len();
        self.out.push(PaintOp {
            seq,
            kind,
            x: at.x,
            y: at.y,
        });
    }
}

/// For each anchor, the sequence number of the closest operation of the
/// same kind, or `None` when nothing lies within `max_distance`.
///
/// Distance is `|Δy| + x_weight·|Δx|`; ties go to the earlier operation.
/// Several anchors may adopt the same operation.
pub fn match_paint_order(
    ops: &[PaintOp],
    anchors: &[(PaintKind, Point)],
    options: &PaintOrderOptions,
) -> Vec<Option<usize>> {
    anchors
        .iter()
        .map(|(kind, at)| {
            let mut best: Option<(f64, usize)> = None;
            for op in ops.iter().filter(|op| op.kind == *kind) {
                let d = (op.y - at.y).abs() + options.x_weight * (op.x - at.x).abs();
                if d > options.max_distance {
                    continue;
                }
                if best.is_none_or(|(best_d, _)| d < best_d) {
                    best = Some((d, op.seq));
                }
            }
            best.map(|(_, seq)| seq)
        })
        .collect()
}
