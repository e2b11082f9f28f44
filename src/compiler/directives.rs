//! Pass 2: directive compilation.
//!
//! Directives are `@name` keywords not preceded by a word character,
//! optionally followed by a parenthesized argument group. The argument group
//! is located with [`find_closing_paren`], a depth-counting scanner, so
//! arguments may nest parentheses freely: `@if(f(a,(b+c)) > 1)`.

use regex::Regex;
use std::sync::LazyLock;

use super::program::EndMode;
use super::token::{Token, line_at, map_text, push_text};
use crate::core::ViewError;

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B@(\w+)").expect("directive pattern is valid"));

/// Every directive the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    If,
    ElseIf,
    Else,
    EndIf,
    Unless,
    EndUnless,
    For,
    EndFor,
    ForEach,
    EndForEach,
    While,
    EndWhile,
    Extends,
    Include,
    Yield,
    Section,
    EndSection,
    Show,
    Append,
    Stop,
    Overwrite,
}

/// Name → directive lookup table.
const DIRECTIVES: &[(&str, Directive)] = &[
    ("if", Directive::If),
    ("elseif", Directive::ElseIf),
    ("else", Directive::Else),
    ("endif", Directive::EndIf),
    ("unless", Directive::Unless),
    ("endunless", Directive::EndUnless),
    ("for", Directive::For),
    ("endfor", Directive::EndFor),
    ("foreach", Directive::ForEach),
    ("endforeach", Directive::EndForEach),
    ("while", Directive::While),
    ("endwhile", Directive::EndWhile),
    ("extends", Directive::Extends),
    ("include", Directive::Include),
    ("yield", Directive::Yield),
    ("section", Directive::Section),
    ("endsection", Directive::EndSection),
    ("show", Directive::Show),
    ("append", Directive::Append),
    ("stop", Directive::Stop),
    ("overwrite", Directive::Overwrite),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    ForEach,
    While,
}

/// What a directive compiles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Start a conditional; `negate` inverts the test, `closer` ends it
    OpenConditional {
        negate: bool,
        closer: Directive,
    },
    /// Start another tested branch of the open conditional
    NextBranch,
    /// Start the fallback branch of the open conditional
    ElseBranch,
    /// End the open conditional
    CloseConditional,
    OpenLoop(LoopKind),
    CloseLoop(LoopKind),
    /// Register the parent template
    Extend,
    /// Execute another template inline
    Include,
    /// Print a block
    Yield,
    /// `begin(name)`
    BeginBlock,
    /// `end()` with the given mode
    EndBlock(EndMode),
}

impl Directive {
    /// Look up a directive by its exact (case-sensitive) name.
    pub fn lookup(name: &str) -> Option<Self> {
        DIRECTIVES.iter().find(|(n, _)| *n == name).map(|(_, d)| *d)
    }

    pub fn name(self) -> &'static str {
        DIRECTIVES.iter().find(|(_, d)| *d == self).map_or("?", |(n, _)| n)
    }

    /// Whether the directive requires an argument group.
    pub fn takes_arguments(self) -> bool {
        matches!(
            self,
            Directive::If
                | Directive::ElseIf
                | Directive::Unless
                | Directive::For
                | Directive::ForEach
                | Directive::While
                | Directive::Extends
                | Directive::Include
                | Directive::Yield
                | Directive::Section
        )
    }

    pub fn emission(self) -> Emission {
        match self {
            Directive::If => Emission::OpenConditional {
                negate: false,
                closer: Directive::EndIf,
            },
            Directive::Unless => Emission::OpenConditional {
                negate: true,
                closer: Directive::EndUnless,
            },
            Directive::ElseIf => Emission::NextBranch,
            Directive::Else => Emission::ElseBranch,
            Directive::EndIf | Directive::EndUnless => Emission::CloseConditional,
            Directive::For => Emission::OpenLoop(LoopKind::For),
            Directive::ForEach => Emission::OpenLoop(LoopKind::ForEach),
            Directive::While => Emission::OpenLoop(LoopKind::While),
            Directive::EndFor => Emission::CloseLoop(LoopKind::For),
            Directive::EndForEach => Emission::CloseLoop(LoopKind::ForEach),
            Directive::EndWhile => Emission::CloseLoop(LoopKind::While),
            Directive::Extends => Emission::Extend,
            Directive::Include => Emission::Include,
            Directive::Yield => Emission::Yield,
            Directive::Section => Emission::BeginBlock,
            Directive::EndSection | Directive::Append | Directive::Stop => {
                Emission::EndBlock(EndMode::Append)
            }
            Directive::Show => Emission::EndBlock(EndMode::Show),
            Directive::Overwrite => Emission::EndBlock(EndMode::Overwrite),
        }
    }
}

impl LoopKind {
    pub fn closer(self) -> Directive {
        match self {
            LoopKind::For => Directive::EndFor,
            LoopKind::ForEach => Directive::EndForEach,
            LoopKind::While => Directive::EndWhile,
        }
    }
}

/// Find the `)` matching the `(` at `open`.
///
/// Parentheses inside single- or double-quoted string literals are ignored.
/// Returns `None` when the group is never closed.
pub fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'('));

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Split every text token on recognized directives.
pub fn compile_directives(template: &str, tokens: Vec<Token>) -> Result<Vec<Token>, ViewError> {
    map_text(tokens, |text, line, out| split_directives(template, text, line, out))
}

fn split_directives(
    template: &str,
    text: &str,
    line: usize,
    out: &mut Vec<Token>,
) -> Result<(), ViewError> {
    let mut cursor = 0;
    let mut search = 0;

    while let Some(caps) = DIRECTIVE_RE.captures_at(text, search) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };

        let Some(directive) = Directive::lookup(name.as_str()) else {
            log_unknown(template, name.as_str());
            search = whole.end();
            continue;
        };

        let directive_line = line_at(text, line, whole.start());
        let after_name = whole.end();
        let paren = after_name
            + text[after_name..].bytes().take_while(|b| *b == b' ' || *b == b'\t').count();

        let (args, end) = if text.as_bytes().get(paren) == Some(&b'(') {
            let close = find_closing_paren(text, paren).ok_or_else(|| ViewError::MalformedDirective {
                template: template.to_string(),
                line: directive_line,
                message: format!("unbalanced parentheses in @{} arguments", directive.name()),
            })?;
            (Some(text[paren..=close].to_string()), close + 1)
        } else {
            (None, after_name)
        };

        push_text(out, &text[cursor..whole.start()], line_at(text, line, cursor));
        out.push(Token::Directive {
            directive,
            args,
            line: directive_line,
        });
        cursor = end;
        search = end;
    }

    push_text(out, &text[cursor..], line_at(text, line, cursor));
    Ok(())
}

fn log_unknown(template: &str, name: &str) {
    let close = DIRECTIVES
        .iter()
        .map(|(known, _)| (*known, strsim::levenshtein(known, name)))
        .filter(|(known, distance)| *distance > 0 && *distance <= 2 && known.len() > 3)
        .min_by_key(|(_, distance)| *distance);

    match close {
        Some((known, _)) => tracing::warn!(
            template,
            "Unknown directive @{name} left as text; did you mean @{known}?"
        ),
        None => tracing::trace!(template, "Leaving @{name} as literal text"),
    }
}
