//! Token stream shared by the compiler passes.
//!
//! Compilation starts from a single [`Token::Text`] holding the whole source.
//! Each pass only splits the `Text` tokens that are still left, so anything an
//! earlier pass consumed is never rescanned.

use super::directives::Directive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal output
    Text {
        text: String,
        line: usize,
    },
    /// `{{-- ... --}}`, kept as an inert annotation
    Comment {
        text: String,
        line: usize,
    },
    /// `@name` with its raw argument group, parentheses included
    Directive {
        directive: Directive,
        args: Option<String>,
        line: usize,
    },
    /// An echo; `expr` is the expression source after escaping was applied
    Echo {
        source: String,
        expr: String,
        line: usize,
    },
}

impl Token {
    pub fn text(text: impl Into<String>, line: usize) -> Self {
        Token::Text {
            text: text.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Token::Text {
                line,
                ..
            }
            | Token::Comment {
                line,
                ..
            }
            | Token::Directive {
                line,
                ..
            }
            | Token::Echo {
                line,
                ..
            } => *line,
        }
    }
}

/// Line of byte `offset` inside a text fragment starting at `line`.
pub(crate) fn line_at(text: &str, line: usize, offset: usize) -> usize {
    line + text[..offset].bytes().filter(|&b| b == b'\n').count()
}

/// Run `split` over every remaining text token, keeping other tokens as-is.
pub(crate) fn map_text<E>(
    tokens: Vec<Token>,
    mut split: impl FnMut(&str, usize, &mut Vec<Token>) -> Result<(), E>,
) -> Result<Vec<Token>, E> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Text {
                text,
                line,
            } => split(&text, line, &mut out)?,
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Push a text token unless it is empty.
pub(crate) fn push_text(out: &mut Vec<Token>, text: &str, line: usize) {
    if !text.is_empty() {
        out.push(Token::text(text, line));
    }
}
