//! Lexer for rule condition and reference-index expressions.

use crate::foundation::error::{RegError, RegResult};

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,

    // Keyword operators (case-insensitive)
    And,
    Or,
    Not,

    // Symbols
    LParen,  // (
    RParen,  // )
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Eq,      // ==
    NotEq,   // !=
    Lt,      // <
    LtEq,    // <=
    Gt,      // >
    GtEq,    // >=

    // End of input
    Eof,
}

/// A token plus its byte offset in the source expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

/// Tokenize an expression string.
pub fn tokenize(src: &str) -> RegResult<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '(' => {
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    pos: i,
                });
                i += 1;
            }
            ')' => {
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    pos: i,
                });
                i += 1;
            }
            '+' => {
                tokens.push(Token {
                    kind: TokenKind::Plus,
                    pos: i,
                });
                i += 1;
            }
            '-' => {
                tokens.push(Token {
                    kind: TokenKind::Minus,
                    pos: i,
                });
                i += 1;
            }
            '*' => {
                tokens.push(Token {
                    kind: TokenKind::Star,
                    pos: i,
                });
                i += 1;
            }
            '/' => {
                tokens.push(Token {
                    kind: TokenKind::Slash,
                    pos: i,
                });
                i += 1;
            }
            '%' => {
                tokens.push(Token {
                    kind: TokenKind::Percent,
                    pos: i,
                });
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::Eq,
                        pos: i,
                    });
                    i += 2;
                } else {
                    return Err(lex_error(src, i, "expected '==' after '='"));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::NotEq,
                        pos: i,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Not,
                        pos: i,
                    });
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::LtEq,
                        pos: i,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Lt,
                        pos: i,
                    });
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token {
                        kind: TokenKind::GtEq,
                        pos: i,
                    });
                    i += 2;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Gt,
                        pos: i,
                    });
                    i += 1;
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token {
                        kind: TokenKind::And,
                        pos: i,
                    });
                    i += 2;
                } else {
                    return Err(lex_error(src, i, "expected '&&'"));
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token {
                        kind: TokenKind::Or,
                        pos: i,
                    });
                    i += 2;
                } else {
                    return Err(lex_error(src, i, "expected '||'"));
                }
            }
            '"' => {
                let (kind, next) = lex_string(src, i)?;
                tokens.push(Token { kind, pos: i });
                i = next;
            }
            _ if c.is_ascii_digit() => {
                let (kind, next) = lex_number(src, i)?;
                tokens.push(Token { kind, pos: i });
                i = next;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let word = &src[start..i];
                let kind = match word.to_ascii_uppercase().as_str() {
                    "TRUE" => TokenKind::True,
                    "FALSE" => TokenKind::False,
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    _ => TokenKind::Ident(word.to_string()),
                };
                tokens.push(Token { kind, pos: start });
            }
            _ => {
                return Err(lex_error(src, i, &format!("unexpected character '{c}'")));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        pos: src.len(),
    });
    Ok(tokens)
}

fn lex_number(src: &str, start: usize) -> RegResult<(TokenKind, usize)> {
    let bytes = src.as_bytes();
    let mut i = start;
    let mut is_float = false;
    while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len()
        && bytes[i] == b'.'
        && bytes
            .get(i + 1)
            .is_some_and(|b| (*b as char).is_ascii_digit())
    {
        is_float = true;
        i += 1;
        while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
            i += 1;
        }
    }
    let text = &src[start..i];
    let kind = if is_float {
        TokenKind::Float(
            text.parse::<f64>()
                .map_err(|e| lex_error(src, start, &format!("invalid float literal: {e}")))?,
        )
    } else {
        TokenKind::Int(
            text.parse::<i64>()
                .map_err(|e| lex_error(src, start, &format!("invalid integer literal: {e}")))?,
        )
    };
    Ok((kind, i))
}

fn lex_string(src: &str, start: usize) -> RegResult<(TokenKind, usize)> {
    let mut out = String::new();
    // Walk chars, not bytes: literals may contain multi-byte UTF-8.
    let mut chars = src[start + 1..].char_indices();
    while let Some((offset, c)) = chars.next() {
        let i = start + 1 + offset;
        match c {
            '"' => return Ok((TokenKind::Str(out), i + 1)),
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| lex_error(src, i, "unterminated escape"))?;
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    other => {
                        return Err(lex_error(
                            src,
                            i,
                            &format!("unsupported escape '\\{other}'"),
                        ));
                    }
                }
            }
            c => out.push(c),
        }
    }
    Err(lex_error(src, start, "unterminated string literal"))
}

fn lex_error(src: &str, pos: usize, msg: &str) -> RegError {
    RegError::evaluation(format!("{msg} at offset {pos} in '{src}'"))
}
