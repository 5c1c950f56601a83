//! Array literal parser.
//!
//! Turns a caller-supplied string such as `[say hello, "a, b", 'c']` into an
//! ordered list of typed values. Tokens are either bare runs (anything but an
//! unescaped quote or comma), double-quoted spans or single-quoted spans;
//! `\"` and `\'` escape the quote characters in all three forms.
//!
//! Empty unquoted tokens (`[, a]`, `[a,, b]`) are dropped, an empty quoted
//! token (`""`) is kept as an empty string.

use crate::domain::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// Target type of each array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Parsed array, one variant per storage width.
///
/// 8 and 16 bit integers are widened to 32 bits after their range is checked.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ArrayValue {
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Uint32(v) => v.len(),
            Self::Uint64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split an array literal into its element strings.
///
/// Quotes are stripped and escapes resolved; no type conversion happens here.
pub fn tokenize(input: &str) -> Vec<String> {
    let inner = input.strip_prefix('[').unwrap_or(input);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    raw_tokens(inner)
        .into_iter()
        .filter_map(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(unescape(strip_quote_pair(trimmed)))
        })
        .collect()
}

/// Parse an array literal into values of `element_type`.
///
/// Any element failing to parse aborts the whole array.
pub fn parse_array(input: &str, element_type: ElementType) -> Result<ArrayValue, ParseError> {
    let tokens = tokenize(input);
    let array = match element_type {
        ElementType::Bool => ArrayValue::Bool(collect(&tokens, element_type, parse_bool)?),
        ElementType::Int8 => {
            ArrayValue::Int32(collect(&tokens, element_type, |t| parse_int::<i8>(t).map(i32::from))?)
        }
        ElementType::Int16 => ArrayValue::Int32(collect(&tokens, element_type, |t| {
            parse_int::<i16>(t).map(i32::from)
        })?),
        ElementType::Int32 => ArrayValue::Int32(collect(&tokens, element_type, parse_int::<i32>)?),
        ElementType::Int64 => ArrayValue::Int64(collect(&tokens, element_type, parse_int::<i64>)?),
        ElementType::Uint8 => {
            ArrayValue::Uint32(collect(&tokens, element_type, |t| parse_int::<u8>(t).map(u32::from))?)
        }
        ElementType::Uint16 => ArrayValue::Uint32(collect(&tokens, element_type, |t| {
            parse_int::<u16>(t).map(u32::from)
        })?),
        ElementType::Uint32 => ArrayValue::Uint32(collect(&tokens, element_type, parse_int::<u32>)?),
        ElementType::Uint64 => ArrayValue::Uint64(collect(&tokens, element_type, parse_int::<u64>)?),
        ElementType::Float => ArrayValue::Float(collect(&tokens, element_type, parse_float::<f32>)?),
        ElementType::Double => {
            ArrayValue::Double(collect(&tokens, element_type, parse_float::<f64>)?)
        }
        ElementType::String => ArrayValue::String(tokens),
    };
    Ok(array)
}

/// Parse a boolean the way the server-side tooling spells them.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a base-10 integer; out-of-range values fail.
pub fn parse_int<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Parse a float with `.` as decimal separator regardless of locale.
pub fn parse_float<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

fn collect<T>(
    tokens: &[String],
    expected: ElementType,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ParseError> {
    tokens
        .iter()
        .map(|token| {
            parse(token).ok_or_else(|| ParseError::InvalidElement {
                token: token.clone(),
                expected,
            })
        })
        .collect()
}

/// Find every token span, mirroring leftmost-first alternation of
/// bare run | double-quoted span | single-quoted span.
fn raw_tokens(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let end = bare_run(bytes, pos).or_else(|| match bytes[pos] {
            b'"' => quoted_span(bytes, pos, b'"'),
            b'\'' => quoted_span(bytes, pos, b'\''),
            _ => None,
        });

        match end {
            Some(end) => {
                tokens.push(&input[pos..end]);
                pos = end;
            }
            None => pos += 1,
        }
    }

    tokens
}

/// Longest run of escaped quotes and characters other than `"`, `'` and `,`.
fn bare_run(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if matches!(bytes.get(pos + 1), Some(b'"' | b'\'')) => pos += 2,
            b'"' | b'\'' | b',' => break,
            _ => pos += 1,
        }
    }
    (pos > start).then_some(pos)
}

/// Span from an opening `quote` to its closing partner.
///
/// Escaped quotes do not close the span. Without an unescaped closing quote
/// the span ends at the quote of the last escape, if there was one.
fn quoted_span(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut pos = start + 1;
    let mut last_escape = None;
    while pos < bytes.len() {
        if bytes[pos] == b'\\' && bytes.get(pos + 1) == Some(&quote) {
            last_escape = Some(pos);
            pos += 2;
        } else if bytes[pos] == quote {
            return Some(pos + 1);
        } else {
            pos += 1;
        }
    }
    last_escape.map(|escape| escape + 2)
}

fn strip_quote_pair(token: &str) -> &str {
    if token.len() > 1 {
        for quote in ['"', '\''] {
            if let Some(inner) = token
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
            {
                return inner;
            }
        }
    }
    token
}

fn unescape(token: &str) -> String {
    token.replace("\\\"", "\"").replace("\\'", "'")
}
