//! Pass 3: echo compilation.
//!
//! Runs three sub-passes in a fixed order over the text that is still left:
//! escaped triple-brace echoes, raw echoes, then regular echoes. Running the
//! triple-brace pass first keeps `{{{` from being read as `{{` plus `{`.

use super::token::{Token, line_at, push_text};
use crate::config::EchoFormat;

const ESCAPED: (&str, &str) = ("{{{", "}}}");
const RAW: (&str, &str) = ("{!!", "!!}");
const REGULAR: (&str, &str) = ("{{", "}}");

/// Compile every echo form in the remaining text tokens.
pub fn compile_echoes(tokens: Vec<Token>, format: &EchoFormat) -> Vec<Token> {
    let tokens = split_all(tokens, ESCAPED, |inner| Some(format!("e({})", inner.trim())));
    let tokens = split_all(tokens, RAW, |inner| Some(inner.trim().to_string()));
    split_regular(tokens, format)
}

fn split_all(
    tokens: Vec<Token>,
    delimiters: (&str, &str),
    mut compile: impl FnMut(&str) -> Option<String>,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Text {
                text,
                line,
            } => split_echoes(&text, line, delimiters, &mut out, |_, inner| compile(inner)),
            other => out.push(other),
        }
    }
    out
}

/// `{{ }}` echoes, honouring the `@{{ ... }}` escape.
fn split_regular(tokens: Vec<Token>, format: &EchoFormat) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Token::Text {
            text,
            line,
        } = token
        else {
            out.push(token);
            continue;
        };

        split_echoes(&text, line, REGULAR, &mut out, |before, inner| {
            if before.ends_with('@') {
                None
            } else {
                Some(format.apply(&rewrite_fallback(inner.trim())))
            }
        });
    }
    merge_escaped(out)
}

/// Split one text fragment on `open ... close` pairs.
///
/// `compile` gets the text preceding the echo and the echo body. Returning
/// `None` marks the echo as escaped: it is kept as literal text and the `@`
/// in front of it is dropped.
fn split_echoes(
    text: &str,
    line: usize,
    (open, close): (&str, &str),
    out: &mut Vec<Token>,
    mut compile: impl FnMut(&str, &str) -> Option<String>,
) {
    let mut cursor = 0;
    let mut search = 0;
    while let Some(rel) = text[search..].find(open) {
        let start = search + rel;
        let body = start + open.len();
        let Some(close_rel) = text[body..].find(close) else {
            break;
        };
        let end = body + close_rel + close.len();
        let inner = &text[body..body + close_rel];

        match compile(&text[cursor..start], inner) {
            Some(expr) => {
                push_text(out, &text[cursor..start], line_at(text, line, cursor));
                out.push(Token::Echo {
                    source: text[start..end].to_string(),
                    expr,
                    line: line_at(text, line, start),
                });
            }
            None => {
                // drop the escaping '@', keep the braces verbatim
                push_text(out, &text[cursor..start - 1], line_at(text, line, cursor));
                push_text(out, &text[start..end], line_at(text, line, start));
            }
        }
        cursor = end;
        search = end;
    }
    push_text(out, &text[cursor..], line_at(text, line, cursor));
}

/// Join adjacent text tokens produced by escaped echoes.
fn merge_escaped(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (
            Some(Token::Text {
                text: prev,
                ..
            }),
            Token::Text {
                text,
                ..
            },
        ) = (out.last_mut(), &token)
        {
            prev.push_str(text);
            continue;
        }
        out.push(token);
    }
    out
}

/// Rewrite `$a or 'b'` into `isset($a) ? $a : 'b'`.
///
/// Only applies to expressions that start with a variable. The split happens
/// at the first whitespace-delimited `or` outside string literals.
pub fn rewrite_fallback(expr: &str) -> String {
    if !expr.starts_with('$') {
        return expr.to_string();
    }
    match find_or(expr) {
        Some((left_end, right_start)) => {
            let left = expr[..left_end].trim_end();
            let right = expr[right_start..].trim_start();
            format!("isset({left}) ? {left} : {right}")
        }
        None => expr.to_string(),
    }
}

/// Byte range of the first ` or ` outside quotes, without its whitespace.
fn find_or(expr: &str) -> Option<(usize, usize)> {
    let bytes = expr.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else if b == b'\'' || b == b'"' {
            quote = Some(b);
        } else if b.is_ascii_whitespace()
            && bytes.get(i + 1..i + 3) == Some(b"or")
            && bytes.get(i + 3).is_some_and(u8::is_ascii_whitespace)
        {
            return Some((i, i + 3));
        }
        i += 1;
    }
    None
}
