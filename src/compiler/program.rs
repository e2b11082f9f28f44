//! Compiled program: the executable form of a template.
//!
//! The token stream produced by the passes is folded into a [`Node`] tree
//! with every expression already parsed. The tree is what gets persisted in
//! the artifact cache, serialized as JSON.

use serde::{Deserialize, Serialize};

use super::directives::{Directive, Emission, LoopKind};
use super::token::Token;
use crate::core::{Result, ViewError};
use crate::expr::{
    Expr, ForEachHeader, ForHeader, ParseError, parse_arguments, parse_expression, parse_for,
    parse_foreach,
};

/// Format tag stored in every artifact. Artifacts with any other tag are stale.
pub const ARTIFACT_FORMAT: &str = "vellum-program/1";

/// Deepest nesting of conditionals and loops a template may use.
pub const MAX_BLOCK_DEPTH: usize = 64;

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub format: String,
    /// Logical name the program was compiled from
    pub template: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Text {
        text: String,
    },
    /// Source comment; produces no output
    Comment {
        text: String,
    },
    Echo {
        expr: Expr,
        line: usize,
    },
    Conditional {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Node>>,
        line: usize,
    },
    ForEach {
        header: ForEachHeader,
        body: Vec<Node>,
        line: usize,
    },
    For {
        header: ForHeader,
        body: Vec<Node>,
        line: usize,
    },
    While {
        test: Expr,
        body: Vec<Node>,
        line: usize,
    },
    /// Register the parent template
    Extends {
        template: Expr,
        line: usize,
    },
    Include {
        template: Expr,
        line: usize,
    },
    Yield {
        block: Expr,
        default: Option<Expr>,
        line: usize,
    },
    /// Open a block, or set it in one go when `inline` is present
    Section {
        block: Expr,
        inline: Option<Expr>,
        line: usize,
    },
    /// Close the innermost open block
    EndSection {
        mode: EndMode,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub test: Expr,
    pub body: Vec<Node>,
}

/// How a closed block is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndMode {
    /// Append to existing content
    Append,
    /// Replace existing content
    Overwrite,
    /// Append, then print the block
    Show,
}

impl Program {
    /// Serialize to artifact code. Output is deterministic for a given tree.
    pub fn to_code(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode artifact code.
    ///
    /// Returns `None` for code that does not decode or carries a different
    /// format tag.
    pub fn from_code(code: &str) -> Option<Self> {
        // Block and expression depth are capped at compile time, so the
        // tree stays shallower than the stack.
        let mut de = serde_json::Deserializer::from_str(code);
        de.disable_recursion_limit();
        let decoded = Program::deserialize(&mut de).and_then(|program| de.end().map(|()| program));
        match decoded {
            Ok(program) if program.format == ARTIFACT_FORMAT => Some(program),
            Ok(program) => {
                tracing::debug!(
                    "Artifact for '{}' has format '{}', expected '{ARTIFACT_FORMAT}'",
                    program.template,
                    program.format
                );
                None
            }
            Err(e) => {
                tracing::debug!("Artifact does not decode: {e}");
                None
            }
        }
    }
}

/// Fold a compiled token stream into a [`Program`].
pub fn assemble(template: &str, tokens: Vec<Token>) -> Result<Program> {
    let mut assembler = Assembler {
        template,
        root: Vec::new(),
        open: Vec::new(),
    };
    for token in tokens {
        assembler.token(token)?;
    }
    assembler.finish()
}

enum LoopHead {
    For(ForHeader),
    ForEach(ForEachHeader),
    While(Expr),
}

/// A construct whose closing directive has not been seen yet.
enum Open {
    Conditional {
        opener: Directive,
        closer: Directive,
        line: usize,
        branches: Vec<Branch>,
        /// Test of the branch being filled; `None` once inside `@else`
        test: Option<Expr>,
        body: Vec<Node>,
    },
    Loop {
        kind: LoopKind,
        opener: Directive,
        line: usize,
        head: LoopHead,
        body: Vec<Node>,
    },
}

impl Open {
    fn describe(&self) -> (Directive, usize) {
        match self {
            Open::Conditional {
                opener,
                line,
                ..
            }
            | Open::Loop {
                opener,
                line,
                ..
            } => (*opener, *line),
        }
    }
}

struct Assembler<'a> {
    template: &'a str,
    root: Vec<Node>,
    open: Vec<Open>,
}

impl Assembler<'_> {
    fn token(&mut self, token: Token) -> Result<()> {
        match token {
            Token::Text {
                text,
                ..
            } => self.push(Node::Text {
                text,
            }),
            Token::Comment {
                text,
                ..
            } => self.push(Node::Comment {
                text,
            }),
            Token::Echo {
                source,
                expr,
                line,
            } => {
                let expr = parse_expression(&expr)
                    .map_err(|e| self.syntax(line, &format!("in echo {source}"), &e))?;
                self.push(Node::Echo {
                    expr,
                    line,
                });
            }
            Token::Directive {
                directive,
                args,
                line,
            } => self.directive(directive, args.as_deref(), line)?,
        }
        Ok(())
    }

    fn directive(&mut self, directive: Directive, args: Option<&str>, line: usize) -> Result<()> {
        let args = self.arguments(directive, args, line)?;
        let context = format!("in @{}", directive.name());

        match directive.emission() {
            Emission::OpenConditional {
                negate,
                closer,
            } => {
                let test = self.expression(args, line, &context)?;
                self.check_depth(line)?;
                self.open.push(Open::Conditional {
                    opener: directive,
                    closer,
                    line,
                    branches: Vec::new(),
                    test: Some(if negate { test.negate() } else { test }),
                    body: Vec::new(),
                });
            }
            Emission::NextBranch => {
                let next = self.expression(args, line, &context)?;
                match self.open.last_mut() {
                    Some(Open::Conditional {
                        opener: Directive::If,
                        branches,
                        test: test @ Some(_),
                        body,
                        ..
                    }) => {
                        if let Some(done) = test.replace(next) {
                            branches.push(Branch {
                                test: done,
                                body: std::mem::take(body),
                            });
                        }
                    }
                    _ => return Err(self.malformed(line, "@elseif without a matching @if")),
                }
            }
            Emission::ElseBranch => match self.open.last_mut() {
                Some(Open::Conditional {
                    branches,
                    test: test @ Some(_),
                    body,
                    ..
                }) => {
                    if let Some(done) = test.take() {
                        branches.push(Branch {
                            test: done,
                            body: std::mem::take(body),
                        });
                    }
                }
                _ => return Err(self.malformed(line, "@else without a matching @if or @unless")),
            },
            Emission::CloseConditional => {
                let Some(Open::Conditional {
                    closer,
                    line: opened,
                    mut branches,
                    test,
                    body,
                    ..
                }) = self.close(directive, line)?
                else {
                    return Err(self.unexpected_close(directive, line));
                };
                if closer != directive {
                    return Err(self.mismatch(directive, closer, opened, line));
                }
                let otherwise = match test {
                    Some(test) => {
                        branches.push(Branch {
                            test,
                            body,
                        });
                        None
                    }
                    None => Some(body),
                };
                self.push(Node::Conditional {
                    branches,
                    otherwise,
                    line: opened,
                });
            }
            Emission::OpenLoop(kind) => {
                let src = args.unwrap_or_default();
                let head = match kind {
                    LoopKind::For => LoopHead::For(
                        parse_for(src).map_err(|e| self.syntax(line, &context, &e))?,
                    ),
                    LoopKind::ForEach => LoopHead::ForEach(
                        parse_foreach(src).map_err(|e| self.syntax(line, &context, &e))?,
                    ),
                    LoopKind::While => LoopHead::While(self.expression(args, line, &context)?),
                };
                self.check_depth(line)?;
                self.open.push(Open::Loop {
                    kind,
                    opener: directive,
                    line,
                    head,
                    body: Vec::new(),
                });
            }
            Emission::CloseLoop(expected) => {
                let Some(Open::Loop {
                    kind,
                    line: opened,
                    head,
                    body,
                    ..
                }) = self.close(directive, line)?
                else {
                    return Err(self.unexpected_close(directive, line));
                };
                if kind != expected {
                    return Err(self.mismatch(directive, kind.closer(), opened, line));
                }
                let node = match head {
                    LoopHead::For(header) => Node::For {
                        header,
                        body,
                        line: opened,
                    },
                    LoopHead::ForEach(header) => Node::ForEach {
                        header,
                        body,
                        line: opened,
                    },
                    LoopHead::While(test) => Node::While {
                        test,
                        body,
                        line: opened,
                    },
                };
                self.push(node);
            }
            Emission::Extend => {
                let [template] = self.exact_arguments::<1>(directive, args, line)?;
                self.push(Node::Extends {
                    template,
                    line,
                });
            }
            Emission::Include => {
                let [template] = self.exact_arguments::<1>(directive, args, line)?;
                self.push(Node::Include {
                    template,
                    line,
                });
            }
            Emission::Yield => {
                let (block, default) = self.one_or_two(directive, args, line)?;
                self.push(Node::Yield {
                    block,
                    default,
                    line,
                });
            }
            Emission::BeginBlock => {
                let (block, inline) = self.one_or_two(directive, args, line)?;
                self.push(Node::Section {
                    block,
                    inline,
                    line,
                });
            }
            Emission::EndBlock(mode) => self.push(Node::EndSection {
                mode,
                line,
            }),
        }
        Ok(())
    }

    /// Validate presence of arguments and strip the outer parentheses.
    fn arguments<'s>(
        &self,
        directive: Directive,
        args: Option<&'s str>,
        line: usize,
    ) -> Result<Option<&'s str>> {
        let inner = args.map(|a| {
            let a = a.trim();
            a.strip_prefix('(').and_then(|a| a.strip_suffix(')')).unwrap_or(a)
        });
        let name = directive.name();
        match (directive.takes_arguments(), inner) {
            (true, None) => Err(self.malformed(line, &format!("@{name} requires arguments"))),
            (true, Some(inner)) if inner.trim().is_empty() => {
                Err(self.malformed(line, &format!("@{name} requires arguments")))
            }
            (false, Some(_)) => {
                Err(self.malformed(line, &format!("@{name} does not take arguments")))
            }
            (_, inner) => Ok(inner),
        }
    }

    fn expression(&self, src: Option<&str>, line: usize, context: &str) -> Result<Expr> {
        parse_expression(src.unwrap_or_default()).map_err(|e| self.syntax(line, context, &e))
    }

    fn argument_list(&self, directive: Directive, src: Option<&str>, line: usize) -> Result<Vec<Expr>> {
        parse_arguments(src.unwrap_or_default())
            .map_err(|e| self.syntax(line, &format!("in @{}", directive.name()), &e))
    }

    fn exact_arguments<const N: usize>(
        &self,
        directive: Directive,
        src: Option<&str>,
        line: usize,
    ) -> Result<[Expr; N]> {
        let args = self.argument_list(directive, src, line)?;
        let found = args.len();
        args.try_into().map_err(|_| {
            self.malformed(
                line,
                &format!("@{} takes {N} argument(s), found {found}", directive.name()),
            )
        })
    }

    fn one_or_two(
        &self,
        directive: Directive,
        src: Option<&str>,
        line: usize,
    ) -> Result<(Expr, Option<Expr>)> {
        let mut args = self.argument_list(directive, src, line)?.into_iter();
        match (args.next(), args.next(), args.next()) {
            (Some(first), second, None) => Ok((first, second)),
            _ => Err(self.malformed(
                line,
                &format!("@{} takes one or two arguments", directive.name()),
            )),
        }
    }

    fn check_depth(&self, line: usize) -> Result<()> {
        if self.open.len() >= MAX_BLOCK_DEPTH {
            return Err(self.malformed(
                line,
                &format!("blocks are nested more than {MAX_BLOCK_DEPTH} levels deep"),
            ));
        }
        Ok(())
    }

    /// Pop the innermost construct for a closing directive.
    fn close(&mut self, directive: Directive, line: usize) -> Result<Option<Open>> {
        if self.open.is_empty() {
            return Err(self.unexpected_close(directive, line));
        }
        Ok(self.open.pop())
    }

    fn push(&mut self, node: Node) {
        let body = match self.open.last_mut() {
            Some(Open::Conditional {
                body,
                ..
            })
            | Some(Open::Loop {
                body,
                ..
            }) => body,
            None => &mut self.root,
        };
        if let (
            Some(Node::Text {
                text: prev,
            }),
            Node::Text {
                text,
            },
        ) = (body.last_mut(), &node)
        {
            prev.push_str(text);
            return;
        }
        body.push(node);
    }

    fn finish(self) -> Result<Program> {
        if let Some(open) = self.open.last() {
            let (opener, line) = open.describe();
            return Err(self.malformed(line, &format!("@{} is never closed", opener.name())));
        }
        Ok(Program {
            format: ARTIFACT_FORMAT.to_string(),
            template: self.template.to_string(),
            nodes: self.root,
        })
    }

    fn malformed(&self, line: usize, message: &str) -> ViewError {
        ViewError::MalformedDirective {
            template: self.template.to_string(),
            line,
            message: message.to_string(),
        }
    }

    fn unexpected_close(&self, directive: Directive, line: usize) -> ViewError {
        self.malformed(line, &format!("@{} without a matching opening directive", directive.name()))
    }

    fn mismatch(&self, found: Directive, expected: Directive, opened: usize, line: usize) -> ViewError {
        self.malformed(
            line,
            &format!(
                "@{} found where @{} was expected (block opened on line {opened})",
                found.name(),
                expected.name()
            ),
        )
    }

    fn syntax(&self, line: usize, context: &str, error: &ParseError) -> ViewError {
        ViewError::ExpressionSyntax {
            template: self.template.to_string(),
            line,
            message: format!("{context}: {error}"),
        }
    }
}
