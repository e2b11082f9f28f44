//! Pass 1: comment stripping.

use super::token::{Token, line_at, push_text};

pub const COMMENT_OPEN: &str = "{{--";
pub const COMMENT_CLOSE: &str = "--}}";

/// Replace every `{{-- ... --}}` span with an inert [`Token::Comment`].
///
/// An unterminated comment opener is left as literal text.
pub fn strip_comments(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Text {
                text,
                line,
            } => split_comments(&text, line, &mut out),
            other => out.push(other),
        }
    }
    out
}

fn split_comments(text: &str, line: usize, out: &mut Vec<Token>) {
    let mut cursor = 0;
    while let Some(rel) = text[cursor..].find(COMMENT_OPEN) {
        let open = cursor + rel;
        let body_start = open + COMMENT_OPEN.len();
        let Some(close_rel) = text[body_start..].find(COMMENT_CLOSE) else {
            break;
        };
        let close = body_start + close_rel;

        push_text(out, &text[cursor..open], line_at(text, line, cursor));
        out.push(Token::Comment {
            text: text[body_start..close].to_string(),
            line: line_at(text, line, open),
        });
        cursor = close + COMMENT_CLOSE.len();
    }
    push_text(out, &text[cursor..], line_at(text, line, cursor));
}
