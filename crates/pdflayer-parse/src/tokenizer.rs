//! Content stream tokenizer.
//!
//! Splits raw content bytes into [`Operator`]s, each carrying the operands
//! that preceded it. Operands accumulate on a stack that is drained every
//! time a keyword is read. Inline image data (`BI … ID … EI`) is consumed
//! and dropped.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Null,
    Name(String),
    /// Bytes of a `( … )` string after escape processing.
    LiteralString(Vec<u8>),
    /// Bytes of a `< … >` string.
    HexString(Vec<u8>),
    Array(Vec<Operand>),
    Dictionary(Vec<(String, Operand)>),
}

impl Operand {
    /// Numeric value of an integer or real operand.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Raw bytes of either string form.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::LiteralString(b) | Operand::HexString(b) => Some(b),
            _ => None,
        }
    }
}

/// An operator keyword with its operands in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

impl Operator {
    /// Operand `index` as a number.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.operands.get(index).and_then(Operand::as_f64)
    }

    /// The first `N` operands as numbers, if all are numeric.
    pub fn numbers<const N: usize>(&self) -> Option<[f64; N]> {
        if self.operands.len() < N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, operand) in out.iter_mut().zip(&self.operands) {
            *slot = operand.as_f64()?;
        }
        Some(out)
    }

    /// Every numeric operand, skipping names and strings.
    pub fn all_numbers(&self) -> Vec<f64> {
        self.operands.iter().filter_map(Operand::as_f64).collect()
    }
}

/// Tokenize a decoded content stream.
///
/// Fails on structural damage such as an unterminated string or array.
/// Unknown bytes outside any token are skipped.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    match tokenize_partial(input) {
        (ops, None) => Ok(ops),
        (_, Some(err)) => Err(err),
    }
}

/// Tokenize as far as possible.
///
/// Returns every operator completed before the first structural error,
/// together with that error.
pub fn tokenize_partial(input: &[u8]) -> (Vec<Operator>, Option<BackendError>) {
    let mut lexer = Lexer::new(input);
    let mut ops = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();

    loop {
        let token = match lexer.next_token() {
            Ok(Some(token)) => token,
            Ok(None) => return (ops, None),
            Err(err) => return (ops, Some(err)),
        };
        match token {
            Token::Operand(operand) => stack.push(operand),
            Token::Keyword(word) => match word.as_str() {
                "true" => stack.push(Operand::Boolean(true)),
                "false" => stack.push(Operand::Boolean(false)),
                "null" => stack.push(Operand::Null),
                "BI" => {
                    if let Err(err) = lexer.skip_inline_image() {
                        return (ops, Some(err));
                    }
                    stack.clear();
                }
                _ => ops.push(Operator {
                    name: word,
                    operands: std::mem::take(&mut stack),
                }),
            },
            Token::ArrayEnd => {
                let err = BackendError::Interpreter("unexpected ']' outside array".to_string());
                return (ops, Some(err));
            }
            Token::DictEnd => {
                let err =
                    BackendError::Interpreter("unexpected '>>' outside dictionary".to_string());
                return (ops, Some(err));
            }
        }
    }
}

enum Token {
    Operand(Operand),
    Keyword(String),
    ArrayEnd,
    DictEnd,
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn skip_blanks(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, BackendError> {
        loop {
            self.skip_blanks();
            let Some(b) = self.peek() else {
                return Ok(None);
            };
            let token = match b {
                b'(' => Token::Operand(Operand::LiteralString(self.literal_string()?)),
                b'<' if self.peek_at(1) == Some(b'<') => {
                    self.pos += 2;
                    Token::Operand(Operand::Dictionary(self.dictionary()?))
                }
                b'<' => Token::Operand(Operand::HexString(self.hex_string()?)),
                b'>' if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    Token::DictEnd
                }
                b'[' => {
                    self.pos += 1;
                    Token::Operand(Operand::Array(self.array()?))
                }
                b']' => {
                    self.pos += 1;
                    Token::ArrayEnd
                }
                b'/' => Token::Operand(Operand::Name(self.name())),
                b'0'..=b'9' | b'+' | b'-' | b'.' => Token::Operand(self.number()?),
                _ if is_regular(b) => Token::Keyword(self.keyword()),
                _ => {
                    self.pos += 1;
                    continue;
                }
            };
            return Ok(Some(token));
        }
    }

    /// Read one operand inside an array or dictionary.
    fn nested_value(&mut self, context: &str) -> Result<Operand, BackendError> {
        match self.next_token()? {
            Some(Token::Operand(operand)) => Ok(operand),
            Some(Token::Keyword(word)) => Ok(match word.as_str() {
                "true" => Operand::Boolean(true),
                "false" => Operand::Boolean(false),
                "null" => Operand::Null,
                _ => Operand::Name(word),
            }),
            Some(Token::ArrayEnd) | Some(Token::DictEnd) => Err(BackendError::Interpreter(
                format!("unexpected delimiter in {context}"),
            )),
            None => Err(BackendError::Interpreter(format!("unterminated {context}"))),
        }
    }

    fn array(&mut self) -> Result<Vec<Operand>, BackendError> {
        let mut items = Vec::new();
        loop {
            self.skip_blanks();
            match self.peek() {
                None => return Err(BackendError::Interpreter("unterminated array".to_string())),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.nested_value("array")?),
            }
        }
    }

    fn dictionary(&mut self) -> Result<Vec<(String, Operand)>, BackendError> {
        let mut entries = Vec::new();
        loop {
            self.skip_blanks();
            match self.peek() {
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated dictionary".to_string(),
                    ));
                }
                Some(b'>') if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    return Ok(entries);
                }
                Some(b'/') => {
                    let key = self.name();
                    self.skip_blanks();
                    let value = self.nested_value("dictionary")?;
                    entries.push((key, value));
                }
                Some(_) => {
                    return Err(BackendError::Interpreter(
                        "expected name key in dictionary".to_string(),
                    ));
                }
            }
        }
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => self.escape(&mut out)?,
                _ => out.push(b),
            }
        }
        Err(BackendError::Interpreter(
            "unterminated literal string".to_string(),
        ))
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> Result<(), BackendError> {
        let Some(b) = self.peek() else {
            return Err(BackendError::Interpreter(
                "unterminated escape in literal string".to_string(),
            ));
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            // line continuation
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut high: Option<u8> = None;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                if let Some(h) = high {
                    out.push(h << 4);
                }
                return Ok(out);
            }
            if is_whitespace(b) {
                continue;
            }
            let digit = hex_value(b).ok_or_else(|| {
                BackendError::Interpreter(format!("invalid hex digit: {:?}", b as char))
            })?;
            match high.take() {
                Some(h) => out.push((h << 4) | digit),
                None => high = Some(digit),
            }
        }
        Err(BackendError::Interpreter("unterminated hex string".to_string()))
    }

    fn name(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        let mut bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(h), Some(l)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                    bytes.push((h << 4) | l);
                    i += 3;
                    continue;
                }
            }
            bytes.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn number(&mut self) -> Result<Operand, BackendError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| BackendError::Interpreter("invalid number token".to_string()))?;
        // a lone sign or dot reads as zero
        if !text.bytes().any(|b| b.is_ascii_digit()) {
            return Ok(Operand::Integer(0));
        }
        if seen_dot {
            text.parse::<f64>()
                .map(Operand::Real)
                .map_err(|_| BackendError::Interpreter(format!("invalid real number: {text}")))
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Operand::Integer(i)),
                Err(_) => text
                    .parse::<f64>()
                    .map(Operand::Real)
                    .map_err(|_| BackendError::Interpreter(format!("invalid integer: {text}"))),
            }
        }
    }

    fn keyword(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Consume an inline image after `BI`, up to and including `EI`.
    fn skip_inline_image(&mut self) -> Result<(), BackendError> {
        loop {
            self.skip_blanks();
            if self.peek().is_none() {
                return Err(BackendError::Interpreter(
                    "unterminated inline image (missing ID)".to_string(),
                ));
            }
            if self.peek() == Some(b'I')
                && self.peek_at(1) == Some(b'D')
                && self.peek_at(2).is_none_or(is_whitespace)
            {
                self.pos += 3;
                break;
            }
            // dictionary key or value
            match self.next_token()? {
                Some(_) => {}
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated inline image (missing ID)".to_string(),
                    ));
                }
            }
        }

        let data_start = self.pos;
        while self.pos + 1 < self.input.len() {
            let at_boundary = self.pos == data_start || is_whitespace(self.input[self.pos - 1]);
            if at_boundary
                && self.input[self.pos] == b'E'
                && self.input[self.pos + 1] == b'I'
                && self
                    .peek_at(2)
                    .is_none_or(|b| is_whitespace(b) || is_delimiter(b))
            {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(BackendError::Interpreter(
            "unterminated inline image (missing EI)".to_string(),
        ))
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
