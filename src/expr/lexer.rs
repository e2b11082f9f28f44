//! Tokenizer for template expressions.

use super::ParseError;

/// Kinds of tokens produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Variable(String),
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Arrow,
    FatArrow,
    Question,
    Colon,
    Coalesce,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Assign,
    PlusAssign,
    MinusAssign,
    Increment,
    Decrement,
    Eof,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) tok: Tok,
    pub(crate) offset: usize,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let tok = match c {
            b'$' => {
                i += 1;
                let name_start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                if i == name_start {
                    return Err(ParseError::new("expected a variable name after '$'", start));
                }
                if bytes[name_start].is_ascii_digit() {
                    return Err(ParseError::new("variable names cannot start with a digit", start));
                }
                Tok::Variable(src[name_start..i].to_string())
            }
            b'\'' | b'"' => {
                let (text, end) = read_string(src, i)?;
                i = end;
                Tok::Str(text)
            }
            b'0'..=b'9' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let is_float = i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit();
                if is_float {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    let text = &src[start..i];
                    Tok::Float(
                        text.parse()
                            .map_err(|_| ParseError::new(format!("invalid number '{text}'"), start))?,
                    )
                } else {
                    let text = &src[start..i];
                    Tok::Int(
                        text.parse()
                            .map_err(|_| ParseError::new(format!("integer '{text}' is too large"), start))?,
                    )
                }
            }
            c if is_ident_byte(c) => {
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                Tok::Ident(src[start..i].to_string())
            }
            _ => {
                let (tok, len) = punctuation(&bytes[i..]).ok_or_else(|| {
                    let ch = src[i..].chars().next().unwrap_or('?');
                    ParseError::new(format!("unexpected character '{ch}'"), start)
                })?;
                i += len;
                tok
            }
        };

        tokens.push(Token {
            tok,
            offset: start,
        });
    }

    tokens.push(Token {
        tok: Tok::Eof,
        offset: src.len(),
    });
    Ok(tokens)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Longest-match punctuation table.
fn punctuation(rest: &[u8]) -> Option<(Tok, usize)> {
    const THREE: &[(&[u8], Tok)] = &[(b"===", Tok::Identical), (b"!==", Tok::NotIdentical)];
    const TWO: &[(&[u8], Tok)] = &[
        (b"==", Tok::EqEq),
        (b"!=", Tok::NotEq),
        (b"<=", Tok::Le),
        (b">=", Tok::Ge),
        (b"&&", Tok::AndAnd),
        (b"||", Tok::OrOr),
        (b"??", Tok::Coalesce),
        (b"->", Tok::Arrow),
        (b"=>", Tok::FatArrow),
        (b"+=", Tok::PlusAssign),
        (b"-=", Tok::MinusAssign),
        (b"++", Tok::Increment),
        (b"--", Tok::Decrement),
    ];

    for (pat, tok) in THREE.iter().chain(TWO) {
        if rest.starts_with(pat) {
            return Some((tok.clone(), pat.len()));
        }
    }

    let tok = match rest.first()? {
        b'(' => Tok::LParen,
        b')' => Tok::RParen,
        b'[' => Tok::LBracket,
        b']' => Tok::RBracket,
        b',' => Tok::Comma,
        b';' => Tok::Semicolon,
        b'.' => Tok::Dot,
        b'?' => Tok::Question,
        b':' => Tok::Colon,
        b'!' => Tok::Bang,
        b'+' => Tok::Plus,
        b'-' => Tok::Minus,
        b'*' => Tok::Star,
        b'/' => Tok::Slash,
        b'%' => Tok::Percent,
        b'<' => Tok::Lt,
        b'>' => Tok::Gt,
        b'=' => Tok::Assign,
        _ => return None,
    };
    Some((tok, 1))
}

/// Read a quoted string starting at `start`; returns the unescaped text and
/// the offset just past the closing quote.
fn read_string(src: &str, start: usize) -> Result<(String, usize), ParseError> {
    let quote = src.as_bytes()[start] as char;
    let mut out = String::new();
    let mut chars = src[start + 1..].char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, c)) if c == quote => out.push(c),
                Some((_, c)) => {
                    out.push('\\');
                    out.push(c);
                }
                None => break,
            },
            c if c == quote => return Ok((out, start + 1 + idx + 1)),
            c => out.push(c),
        }
    }

    Err(ParseError::new("unterminated string literal", start))
}
