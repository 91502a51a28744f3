//! ToUnicode CMap parsing.
//!
//! A CMap body is itself a content-stream-like program, so it is run
//! through the same [`tokenize`] state machine: the hex operands of a
//! `beginbfchar … endbfchar` block arrive as the operands of `endbfchar`.

use std::collections::HashMap;

use crate::tokenizer::{Operand, tokenize};

/// Character code to Unicode text mapping from a `/ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    mappings: HashMap<u32, String>,
    /// Source code width in bytes, taken from the first mapping seen.
    code_bytes: Option<usize>,
}

impl ToUnicode {
    /// Parse a CMap program. Returns `None` when it cannot be tokenized
    /// or contains no mappings.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let ops = tokenize(data).ok()?;
        let mut map = ToUnicode::default();
        for op in &ops {
            match op.name.as_str() {
                "endbfchar" => {
                    for pair in op.operands.chunks_exact(2) {
                        map.add_char(&pair[0], &pair[1]);
                    }
                }
                "endbfrange" => {
                    for triple in op.operands.chunks_exact(3) {
                        map.add_range(&triple[0], &triple[1], &triple[2]);
                    }
                }
                _ => {}
            }
        }
        (!map.mappings.is_empty()).then_some(map)
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Width of source codes in bytes, if any mapping declared one.
    pub fn code_bytes(&self) -> Option<usize> {
        self.code_bytes
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn note_width(&mut self, src: &[u8]) {
        if self.code_bytes.is_none() && !src.is_empty() {
            self.code_bytes = Some(src.len().min(4));
        }
    }

    fn add_char(&mut self, src: &Operand, dst: &Operand) {
        let Some(src) = src.as_bytes() else {
            return;
        };
        let text = match dst {
            Operand::HexString(bytes) => utf16be_to_string(bytes),
            Operand::Name(name) => name.clone(),
            _ => return,
        };
        self.note_width(src);
        self.mappings.insert(code_of(src), text);
    }

    fn add_range(&mut self, lo: &Operand, hi: &Operand, dst: &Operand) {
        let (Some(lo_bytes), Some(hi_bytes)) = (lo.as_bytes(), hi.as_bytes()) else {
            return;
        };
        self.note_width(lo_bytes);
        let (lo, hi) = (code_of(lo_bytes), code_of(hi_bytes));
        if hi < lo || hi - lo > 0xFFFF {
            return;
        }
        match dst {
            Operand::HexString(base) => {
                let mut units = utf16_units(base);
                for code in lo..=hi {
                    self.mappings.insert(code, String::from_utf16_lossy(&units));
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
            }
            Operand::Array(targets) => {
                for (code, target) in (lo..=hi).zip(targets) {
                    if let Some(bytes) = target.as_bytes() {
                        self.mappings.insert(code, utf16be_to_string(bytes));
                    }
                }
            }
            _ => {}
        }
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn utf16be_to_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00660069>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn parses_chars_and_ranges() {
        let map = ToUnicode::parse(CMAP).unwrap();
        assert_eq!(map.lookup(0x03), Some(" "));
        assert_eq!(map.lookup(0x11), Some("fi"));
        assert_eq!(map.lookup(0x24), Some("A"));
        assert_eq!(map.lookup(0x26), Some("C"));
        assert_eq!(map.lookup(0x31), Some("y"));
        assert_eq!(map.lookup(0x27), None);
        assert_eq!(map.code_bytes(), Some(2));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn single_byte_codes() {
        let map = ToUnicode::parse(b"1 beginbfchar <41> <0042> endbfchar").unwrap();
        assert_eq!(map.lookup(0x41), Some("B"));
        assert_eq!(map.code_bytes(), Some(1));
    }

    #[test]
    fn empty_or_broken_programs_yield_none() {
        assert!(ToUnicode::parse(b"begincmap endcmap").is_none());
        assert!(ToUnicode::parse(b"1 beginbfchar <41> (unterminated").is_none());
    }
}
