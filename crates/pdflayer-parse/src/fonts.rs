//! Font dictionaries: glyph widths, vertical metrics and text decoding.
//!
//! Simple fonts decode one byte per glyph through `/ToUnicode` when
//! present, then `/Differences`, then Windows-1252 (WinAnsi). Type0
//! fonts decode two bytes per glyph and need `/ToUnicode` for text.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use crate::cmap::ToUnicode;
use crate::objects::{get, get_dict, get_name, get_number, number, resolve};

/// Glyph width, in thousandths of text space, used when nothing is known.
const FALLBACK_WIDTH: f64 = 500.0;

/// A glyph decoded from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    pub code: u32,
    pub text: String,
    /// Advance width in thousandths of text space.
    pub width: f64,
    /// Single-byte code 32, which receives word spacing.
    pub is_word_space: bool,
}

/// Metrics and decoding tables of one font resource.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    /// `/BaseFont` with any subset prefix kept; canonicalized later.
    pub base_name: String,
    /// `/Ascent` / 1000 from the font descriptor.
    pub ascent: Option<f64>,
    /// `/Descent` / 1000 from the font descriptor (usually negative).
    pub descent: Option<f64>,
    composite: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<ToUnicode>,
    differences: HashMap<u32, char>,
}

impl LoadedFont {
    /// Defaults for a font resource that could not be found.
    pub fn fallback(resource_name: &str) -> Self {
        Self {
            base_name: resource_name.to_string(),
            ascent: None,
            descent: None,
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: FALLBACK_WIDTH,
            to_unicode: None,
            differences: HashMap::new(),
        }
    }

    /// Read a font dictionary.
    pub fn load(doc: &Document, font: &Dictionary, resource_name: &str) -> Self {
        let base_name = get_name(doc, font, b"BaseFont").unwrap_or_else(|| resource_name.to_string());
        let composite = get_name(doc, font, b"Subtype").as_deref() == Some("Type0");
        let to_unicode = get(doc, font, b"ToUnicode")
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| crate::objects::decode_stream(stream).ok())
            .and_then(|bytes| ToUnicode::parse(&bytes));

        let mut loaded = Self {
            to_unicode,
            composite,
            ..Self::fallback(&base_name)
        };

        if composite {
            let descendant = get(doc, font, b"DescendantFonts")
                .and_then(|obj| obj.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|obj| resolve(doc, obj))
                .and_then(|obj| obj.as_dict().ok());
            if let Some(cid_font) = descendant {
                loaded.default_width = get_number(doc, cid_font, b"DW").unwrap_or(1000.0);
                if let Some(w) = get(doc, cid_font, b"W").and_then(|obj| obj.as_array().ok()) {
                    loaded.cid_widths = parse_cid_widths(doc, w);
                }
                loaded.read_descriptor(doc, cid_font);
            } else {
                loaded.default_width = 1000.0;
            }
        } else {
            loaded.first_char = get_number(doc, font, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
            if let Some(w) = get(doc, font, b"Widths").and_then(|obj| obj.as_array().ok()) {
                loaded.widths = w
                    .iter()
                    .map(|obj| number(resolve(doc, obj)).unwrap_or(0.0))
                    .collect();
            }
            if is_monospaced_standard(&base_name) {
                loaded.default_width = 600.0;
            }
            loaded.read_descriptor(doc, font);
            loaded.differences = read_differences(doc, font);
        }
        loaded
    }

    fn read_descriptor(&mut self, doc: &Document, font: &Dictionary) {
        let Some(descriptor) = get_dict(doc, font, b"FontDescriptor") else {
            return;
        };
        self.ascent = get_number(doc, descriptor, b"Ascent")
            .filter(|a| *a > 0.0)
            .map(|a| a / 1000.0);
        self.descent = get_number(doc, descriptor, b"Descent").map(|d| d / 1000.0);
        if let Some(missing) = get_number(doc, descriptor, b"MissingWidth").filter(|w| *w > 0.0) {
            self.default_width = missing;
        }
    }

    fn width_of(&self, code: u32) -> f64 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    fn code_bytes(&self) -> usize {
        if self.composite {
            self.to_unicode
                .as_ref()
                .and_then(ToUnicode::code_bytes)
                .unwrap_or(2)
        } else {
            1
        }
    }

    fn text_of(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        if self.composite {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        if let Some(c) = self.differences.get(&code) {
            return c.to_string();
        }
        let byte = [(code & 0xFF) as u8];
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&byte);
        text.chars().filter(|c| !c.is_control()).collect()
    }

    /// Split a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let width = self.code_bytes();
        bytes
            .chunks(width)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                DecodedGlyph {
                    code,
                    text: self.text_of(code),
                    width: self.width_of(code),
                    is_word_space: width == 1 && code == 32,
                }
            })
            .collect()
    }
}

fn is_monospaced_standard(base_name: &str) -> bool {
    base_name.trim_start_matches('/').starts_with("Courier")
}

/// `/W [c [w1 w2 …] cfirst clast w …]`
fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(start) = number(resolve(doc, &w[i])) else {
            break;
        };
        let start = start.max(0.0) as u32;
        match w.get(i + 1).map(|obj| resolve(doc, obj)) {
            Some(Object::Array(list)) => {
                for (offset, obj) in list.iter().enumerate() {
                    let Some(cid) = u32::try_from(offset).ok().and_then(|o| start.checked_add(o))
                    else {
                        break;
                    };
                    if let Some(width) = number(resolve(doc, obj)) {
                        widths.insert(cid, width);
                    }
                }
                i += 2;
            }
            Some(end_obj) => {
                let (Some(end), Some(width)) = (
                    number(end_obj),
                    w.get(i + 2).and_then(|obj| number(resolve(doc, obj))),
                ) else {
                    break;
                };
                let end = end.max(0.0) as u32;
                if end >= start && end - start <= 0xFFFF {
                    for cid in start..=end {
                        widths.insert(cid, width);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

fn read_differences(doc: &Document, font: &Dictionary) -> HashMap<u32, char> {
    let mut map = HashMap::new();
    let Some(encoding) = get_dict(doc, font, b"Encoding") else {
        return map;
    };
    let Some(diffs) = get(doc, encoding, b"Differences").and_then(|obj| obj.as_array().ok()) else {
        return map;
    };
    // `None` until the next valid starting code.
    let mut code = Some(0u32);
    for obj in diffs {
        match resolve(doc, obj) {
            Object::Integer(i) => code = u32::try_from(*i).ok(),
            Object::Name(name) => {
                let Some(current) = code else {
                    continue;
                };
                if let Some(c) = glyph_name_to_char(&String::from_utf8_lossy(name)) {
                    map.insert(current, c);
                }
                code = current.checked_add(1);
            }
            _ => {}
        }
    }
    map
}

/// Unicode value of a glyph name: `uniXXXX`, single letters and digits,
/// and the handful of punctuation names common in subset fonts.
fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni") {
        return u32::from_str_radix(hex.get(..4)?, 16)
            .ok()
            .and_then(char::from_u32);
    }
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c);
    }
    const DIGITS: [&str; 10] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    if let Some(d) = DIGITS.iter().position(|n| *n == name) {
        return char::from_digit(d as u32, 10);
    }
    let c = match name {
        "space" => ' ',
        "period" => '.',
        "comma" => ',',
        "colon" => ':',
        "semicolon" => ';',
        "hyphen" | "minus" => '-',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "quoteright" => '\u{2019}',
        "quoteleft" => '\u{2018}',
        "quotedbl" => '"',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "slash" => '/',
        "at" => '@',
        "ampersand" => '&',
        "percent" => '%',
        "dollar" => '$',
        "exclam" => '!',
        "question" => '?',
        "bullet" => '\u{2022}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        _ => return None,
    };
    Some(c)
}
