// 🏗️ Table-Text Parser - Recursive descent reader for addon exports
// Reads the addon's saved-variables format into the Value model.
//
// Grammar (literal data only):
//   document := [identifier '='] value
//   value    := 'true' | 'false' | 'nil' | number | string | table
//   table    := '{' [entry {(','|';') entry} [','|';']] '}'
//   entry    := '[' key ']' '=' value | identifier '=' value | value
//
// Whitespace and `--` line comments may appear between any two tokens.

use crate::value::{Key, Number, Table, Value};
use tracing::{debug, warn};

/// Default bound on nested tables before the parser gives up
pub const DEFAULT_MAX_DEPTH: usize = 128;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid table key at offset {offset}: {reason}")]
    InvalidKey { offset: usize, reason: &'static str },

    #[error("tables nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },

    #[error("document contains no value")]
    Empty,
}

// ============================================================================
// PARSER
// ============================================================================

/// TableParser - configurable entry point
///
/// `parse` never fails: structural errors are logged and turned into an
/// empty table, since callers treat "empty" as "no usable data".
#[derive(Debug, Clone)]
pub struct TableParser {
    max_depth: usize,
}

impl TableParser {
    pub fn new() -> Self {
        TableParser {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        TableParser { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse a document, reporting the first structural error
    pub fn try_parse(&self, text: &str) -> Result<Value, ParseError> {
        let mut cursor = Cursor::new(text, self.max_depth);
        cursor.document()
    }

    /// Parse a document; structural failures yield an empty table
    pub fn parse(&self, text: &str) -> Value {
        match self.try_parse(text) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, bytes = text.len(), "addon export could not be parsed");
                Value::empty_table()
            }
        }
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with default settings
pub fn parse(text: &str) -> Value {
    TableParser::new().parse(text)
}

// ============================================================================
// CURSOR
// ============================================================================

struct Cursor<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, max_depth: usize) -> Self {
        Cursor {
            text,
            src: text.as_bytes(),
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Position after any whitespace and line comments starting at `from`
    fn trivia_end(&self, mut from: usize) -> usize {
        while from < self.src.len() {
            let b = self.src[from];
            if b.is_ascii_whitespace() {
                from += 1;
            } else if b == b'-' && self.src.get(from + 1) == Some(&b'-') {
                while from < self.src.len() && self.src[from] != b'\n' {
                    from += 1;
                }
            } else {
                break;
            }
        }
        from
    }

    fn skip_trivia(&mut self) {
        self.pos = self.trivia_end(self.pos);
    }

    /// End offset of an identifier starting at `from`, if one starts there
    fn identifier_end(&self, from: usize) -> Option<usize> {
        match self.src.get(from) {
            Some(&b) if is_ident_start(b) => {}
            _ => return None,
        }
        let mut end = from + 1;
        while end < self.src.len() && is_ident_continue(self.src[end]) {
            end += 1;
        }
        Some(end)
    }

    /// `identifier =` at the cursor; returns (name end, offset after '=')
    fn assignment_ahead(&self) -> Option<(usize, usize)> {
        let name_end = self.identifier_end(self.pos)?;
        let eq = self.trivia_end(name_end);
        if self.src.get(eq) == Some(&b'=') && self.src.get(eq + 1) != Some(&b'=') {
            Some((name_end, eq + 1))
        } else {
            None
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.text.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(found) => ParseError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => ParseError::UnexpectedEof { expected },
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), ParseError> {
        self.skip_trivia();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    // ------------------------------------------------------------------------
    // Grammar
    // ------------------------------------------------------------------------

    fn document(&mut self) -> Result<Value, ParseError> {
        if self.text.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }
        self.skip_trivia();

        // Serialized variable name, e.g. `WoWStatTrackerDB = {...}`
        if let Some((_, after_eq)) = self.assignment_ahead() {
            self.pos = after_eq;
            self.skip_trivia();
        }

        if self.peek().is_none() {
            return Err(ParseError::Empty);
        }

        let value = self.value()?;

        self.skip_trivia();
        if self.pos < self.src.len() {
            debug!(offset = self.pos, "ignoring content after top-level value");
        }
        Ok(value)
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof { expected: "value" }),
            Some(b'{') => self.table(),
            Some(b'"') | Some(b'\'') => self.string().map(Value::Str),
            Some(b) if b == b'-' || b == b'+' || b.is_ascii_digit() => Ok(self.number()),
            Some(b) if is_ident_start(b) => {
                let end = self.identifier_end(self.pos).unwrap_or(self.pos);
                let value = match &self.text[self.pos..end] {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "nil" => Value::Nil,
                    _ => return Err(self.unexpected("value")),
                };
                self.pos = end;
                Ok(value)
            }
            Some(_) => Err(self.unexpected("value")),
        }
    }

    /// Numbers never abort the parse: an unreadable token becomes nil
    fn number(&mut self) -> Value {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'.' => self.pos += 1,
                b'e' | b'E' => {
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'-') | Some(b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let token = &self.text[start..self.pos];
        let is_float = token.contains(['.', 'e', 'E']);

        if !is_float {
            if let Ok(i) = token.parse::<i64>() {
                return Value::Number(Number::Int(i));
            }
        }
        // Floats, and integers too wide for i64
        match token.parse::<f64>() {
            Ok(f) => Value::Number(Number::Float(f)),
            Err(_) => {
                debug!(token, offset = start, "unparsable number read as nil");
                Value::Nil
            }
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.src[self.pos];
        self.pos += 1;

        let mut buf: Vec<u8> = Vec::new();
        loop {
            let b = match self.peek() {
                Some(b) => b,
                None => return Err(ParseError::UnterminatedString { offset: start }),
            };
            if b == quote {
                self.pos += 1;
                break;
            }
            if b == b'\\' {
                let escaped = match self.src.get(self.pos + 1) {
                    Some(&e) => e,
                    None => return Err(ParseError::UnterminatedString { offset: start }),
                };
                buf.push(match escaped {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    other => other,
                });
                self.pos += 2;
            } else {
                buf.push(b);
                self.pos += 1;
            }
        }

        // Only ASCII bytes were rewritten, so the buffer is still UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn table(&mut self) -> Result<Value, ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                offset: self.pos,
            });
        }
        self.depth += 1;
        self.pos += 1; // '{'

        let mut table = Table::new();
        let mut next_index: i64 = 1;

        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof { expected: "'}'" }),
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b'[') => {
                    self.pos += 1;
                    self.skip_trivia();
                    let key_offset = self.pos;
                    let key = match self.peek() {
                        Some(b'"') | Some(b'\'') => Key::Str(self.string()?),
                        _ => key_from_value(self.value()?, key_offset)?,
                    };
                    self.expect(b']', "']'")?;
                    self.expect(b'=', "'='")?;
                    let value = self.value()?;
                    table.insert(key, value);
                }
                Some(_) => {
                    if let Some((name_end, after_eq)) = self.assignment_ahead() {
                        let key = Key::Str(self.text[self.pos..name_end].to_string());
                        self.pos = after_eq;
                        let value = self.value()?;
                        table.insert(key, value);
                    } else {
                        let value = self.value()?;
                        table.insert(Key::Int(next_index), value);
                        next_index += 1;
                    }
                }
            }

            self.skip_trivia();
            if matches!(self.peek(), Some(b',') | Some(b';')) {
                self.pos += 1;
            }
        }

        self.depth -= 1;
        Ok(Value::Table(table))
    }
}

/// Bracketed non-string keys: integral numbers become integer keys
fn key_from_value(value: Value, offset: usize) -> Result<Key, ParseError> {
    match value {
        Value::Number(Number::Int(i)) => Ok(Key::Int(i)),
        Value::Number(Number::Float(f))
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
        {
            Ok(Key::Int(f as i64))
        }
        Value::Number(n) => Ok(Key::Str(n.to_string())),
        Value::Bool(b) => Ok(Key::Str(b.to_string())),
        Value::Str(s) => Ok(Key::Str(s)),
        Value::Nil => Err(ParseError::InvalidKey {
            offset,
            reason: "nil cannot be a key",
        }),
        Value::Table(_) => Err(ParseError::InvalidKey {
            offset,
            reason: "tables cannot be keys",
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
