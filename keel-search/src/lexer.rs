//! Tokenizer for filter expressions.

use crate::filter::CmpOp;
use keel_core::KeelError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Field name or keyword (`true`, `false`, `null`). May contain dots so
    /// the resolver can reject dotted paths explicitly.
    Ident(String),
    Str(String),
    Num(f64),
    Op(CmpOp),
    And,
    Or,
    Bang,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset in the input.
    pub offset: usize,
    /// Byte length in the input.
    pub len: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, KeelError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let b = bytes[pos];

        let kind = match b {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'(' => {
                pos += 1;
                TokenKind::LParen
            }
            b')' => {
                pos += 1;
                TokenKind::RParen
            }
            b'&' | b'|' => {
                if bytes.get(pos + 1) != Some(&b) {
                    let op = if b == b'&' { "&&" } else { "||" };
                    return Err(KeelError::invalid_filter_at(
                        format!("expected `{op}`"),
                        &input[start..start + 1],
                        start,
                    ));
                }
                pos += 2;
                if b == b'&' { TokenKind::And } else { TokenKind::Or }
            }
            b'=' => {
                pos += 1;
                TokenKind::Op(CmpOp::Eq)
            }
            b'~' => {
                pos += 1;
                TokenKind::Op(CmpOp::Like)
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::Op(CmpOp::Ne)
                } else {
                    pos += 1;
                    TokenKind::Bang
                }
            }
            b'>' | b'<' => {
                let or_equal = bytes.get(pos + 1) == Some(&b'=');
                pos += if or_equal { 2 } else { 1 };
                TokenKind::Op(match (b, or_equal) {
                    (b'>', false) => CmpOp::Gt,
                    (b'>', true) => CmpOp::Gte,
                    (_, false) => CmpOp::Lt,
                    (_, true) => CmpOp::Lte,
                })
            }
            b'"' | b'\'' => {
                let (text, end) = read_string(input, start)?;
                pos = end;
                TokenKind::Str(text)
            }
            b'-' | b'0'..=b'9' => {
                let end = scan_number(bytes, start).ok_or_else(|| {
                    KeelError::invalid_filter_at("malformed number", &input[start..start + 1], start)
                })?;
                let literal = &input[start..end];
                let number = literal.parse::<f64>().map_err(|_| {
                    KeelError::invalid_filter_at("malformed number", literal, start)
                })?;
                if !number.is_finite() {
                    return Err(KeelError::invalid_filter_at("number out of range", literal, start));
                }
                pos = end;
                TokenKind::Num(number)
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'_' | b'.'))
                {
                    pos += 1;
                }
                TokenKind::Ident(input[start..pos].to_string())
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(KeelError::invalid_filter_at(
                    "unexpected character",
                    ch.to_string(),
                    start,
                ));
            }
        };

        tokens.push(Token {
            kind,
            offset: start,
            len: pos - start,
        });
    }

    Ok(tokens)
}

/// `-?\d+(\.\d+)?` starting at `start`; returns the end offset.
fn scan_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    if bytes[pos] == b'-' {
        pos += 1;
    }
    let digits = |mut pos: usize| {
        let from = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        (pos > from).then_some(pos)
    };

    pos = digits(pos)?;
    if bytes.get(pos) == Some(&b'.') {
        pos = digits(pos + 1)?;
    }
    Some(pos)
}

/// Read a quoted string starting at the opening quote. Backslash escapes
/// the next character.
fn read_string(input: &str, start: usize) -> Result<(String, usize), KeelError> {
    let mut chars = input[start..].char_indices();
    let quote = match chars.next() {
        Some((_, quote)) => quote,
        None => return Err(KeelError::invalid_filter("unterminated string literal")),
    };

    let mut text = String::new();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((text, start + i + c.len_utf8())),
            c => text.push(c),
        }
    }

    Err(KeelError::invalid_filter_at(
        "unterminated string literal",
        &input[start..],
        start,
    ))
}
