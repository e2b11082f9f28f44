//! Recursive-descent parser for template expressions.
//!
//! Precedence, lowest first: ternary, `??`, `||`/`or`, `&&`/`and`, equality,
//! comparison, additive, multiplicative, unary, postfix.

use serde_json::Value;

use super::ParseError;
use super::ast::{Assignment, BinaryOp, Expr, ForEachHeader, ForHeader, UnaryOp};
use super::lexer::{Tok, Token, tokenize};

/// Deepest expression tree the parser builds. Evaluation and artifact
/// decoding both recurse once per level.
pub const MAX_DEPTH: usize = 128;

/// Parse a single expression.
pub fn parse_expression(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a comma-separated argument list (no surrounding parentheses).
pub fn parse_arguments(src: &str) -> Result<Vec<Expr>, ParseError> {
    let mut parser = Parser::new(src)?;
    if parser.at(&Tok::Eof) {
        return Ok(Vec::new());
    }
    let mut args = vec![parser.expression()?];
    while parser.eat(&Tok::Comma) {
        args.push(parser.expression()?);
    }
    parser.expect_end()?;
    Ok(args)
}

/// Parse a `@foreach` header: `EXPR as $value` or `EXPR as $key => $value`.
pub fn parse_foreach(src: &str) -> Result<ForEachHeader, ParseError> {
    let mut parser = Parser::new(src)?;
    let source = parser.expression()?;
    if !parser.eat_keyword("as") {
        return Err(parser.error("expected 'as' in foreach header"));
    }
    let first = parser.variable_name()?;
    let (key, value) = if parser.eat(&Tok::FatArrow) {
        (Some(first), parser.variable_name()?)
    } else {
        (None, first)
    };
    parser.expect_end()?;
    Ok(ForEachHeader {
        source,
        key,
        value,
    })
}

/// Parse a C-style `@for` header: `init; condition; step`.
pub fn parse_for(src: &str) -> Result<ForHeader, ParseError> {
    let mut parser = Parser::new(src)?;
    let init = parser.assignments(&Tok::Semicolon)?;
    parser.expect(&Tok::Semicolon, "';' after for initializer")?;
    let condition = if parser.at(&Tok::Semicolon) {
        None
    } else {
        Some(parser.expression()?)
    };
    parser.expect(&Tok::Semicolon, "';' after for condition")?;
    let step = parser.assignments(&Tok::Eof)?;
    parser.expect_end()?;
    Ok(ForHeader {
        init,
        condition,
        step,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn at(&self, tok: &Tok) -> bool {
        self.peek() == tok
    }

    fn advance(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if !matches!(tok, Tok::Eof) {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.at(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Tok::Ident(name) if name.eq_ignore_ascii_case(word))
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.at_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), ParseError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.at(&Tok::Eof) {
            Ok(())
        } else {
            Err(self.error(format!("unexpected {}", describe(self.peek()))))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.offset())
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn variable_name(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Tok::Variable(name) => Ok(name),
            other => Err(ParseError::new(
                format!("expected a variable, found {}", describe(&other)),
                self.tokens[self.pos.saturating_sub(1)].offset,
            )),
        }
    }

    fn assignments(&mut self, terminator: &Tok) -> Result<Vec<Assignment>, ParseError> {
        let mut list = Vec::new();
        if self.at(terminator) {
            return Ok(list);
        }
        loop {
            list.push(self.assignment()?);
            if !self.eat(&Tok::Comma) {
                return Ok(list);
            }
        }
    }

    fn assignment(&mut self) -> Result<Assignment, ParseError> {
        if self.eat(&Tok::Increment) {
            return Ok(Assignment::Increment {
                name: self.variable_name()?,
            });
        }
        if self.eat(&Tok::Decrement) {
            return Ok(Assignment::Decrement {
                name: self.variable_name()?,
            });
        }

        let name = self.variable_name()?;
        match self.advance() {
            Tok::Assign => Ok(Assignment::Set {
                name,
                value: self.expression()?,
            }),
            Tok::PlusAssign => Ok(Assignment::AddAssign {
                name,
                value: self.expression()?,
            }),
            Tok::MinusAssign => Ok(Assignment::SubAssign {
                name,
                value: self.expression()?,
            }),
            Tok::Increment => Ok(Assignment::Increment {
                name,
            }),
            Tok::Decrement => Ok(Assignment::Decrement {
                name,
            }),
            other => Err(ParseError::new(
                format!("expected an assignment to ${name}, found {}", describe(&other)),
                self.tokens[self.pos.saturating_sub(1)].offset,
            )),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let expr = self.ternary()?;
        self.ascend(1);
        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let test = self.coalesce()?;
        if !self.eat(&Tok::Question) {
            return Ok(test);
        }
        let then = if self.eat(&Tok::Colon) {
            None
        } else {
            let then = self.expression()?;
            self.expect(&Tok::Colon, "':' in conditional expression")?;
            Some(Box::new(then))
        };
        let otherwise = self.expression()?;
        Ok(Expr::Ternary {
            test: Box::new(test),
            then,
            otherwise: Box::new(otherwise),
        })
    }

    fn coalesce(&mut self) -> Result<Expr, ParseError> {
        let left = self.logical_or()?;
        if self.eat(&Tok::Coalesce) {
            self.descend()?;
            let right = self.coalesce()?;
            self.ascend(1);
            return Ok(Expr::Coalesce {
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;
        let mut links = 0;
        while self.eat(&Tok::OrOr) || self.eat_keyword("or") {
            self.descend()?;
            links += 1;
            let right = self.logical_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        let mut links = 0;
        while self.eat(&Tok::AndAnd) || self.eat_keyword("and") {
            self.descend()?;
            links += 1;
            let right = self.equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::EqEq => BinaryOp::Eq,
                Tok::NotEq => BinaryOp::NotEq,
                Tok::Identical => BinaryOp::Identical,
                Tok::NotIdentical => BinaryOp::NotIdentical,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let right = self.comparison()?;
            left = binary(op, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::Lt => BinaryOp::Lt,
                Tok::Le => BinaryOp::Le,
                Tok::Gt => BinaryOp::Gt,
                Tok::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinaryOp::Add,
                Tok::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::Star => BinaryOp::Mul,
                Tok::Slash => BinaryOp::Div,
                Tok::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
        self.ascend(links);
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.eat(&Tok::Bang) || self.eat_keyword("not") {
            UnaryOp::Not
        } else if self.eat(&Tok::Minus) {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        self.descend()?;
        let operand = self.unary()?;
        self.ascend(1);
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        let mut links = 0;
        loop {
            if self.eat(&Tok::Dot) || self.eat(&Tok::Arrow) {
                self.descend()?;
                links += 1;
                let field = match self.advance() {
                    Tok::Ident(name) => name,
                    Tok::Int(index) => index.to_string(),
                    other => {
                        return Err(self.error(format!(
                            "expected a field name, found {}",
                            describe(&other)
                        )));
                    }
                };
                expr = Expr::Member {
                    target: Box::new(expr),
                    field,
                };
            } else if self.eat(&Tok::LBracket) {
                self.descend()?;
                links += 1;
                let index = self.expression()?;
                self.expect(&Tok::RBracket, "']'")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.ascend(links);
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.advance() {
            Tok::Int(n) => Ok(literal(Value::from(n))),
            Tok::Float(f) => serde_json::Number::from_f64(f)
                .map(|n| literal(Value::Number(n)))
                .ok_or_else(|| ParseError::new("number is not finite", offset)),
            Tok::Str(s) => Ok(literal(Value::String(s))),
            Tok::Variable(name) => Ok(Expr::Var {
                name,
            }),
            Tok::LParen => {
                let inner = self.expression()?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(inner)
            }
            Tok::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Tok::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if self.eat(&Tok::RBracket) {
                            break;
                        }
                        self.expect(&Tok::Comma, "',' or ']' in array literal")?;
                    }
                }
                Ok(Expr::Array {
                    items,
                })
            }
            Tok::Ident(name) => self.identifier(name, offset),
            other => Err(ParseError::new(format!("unexpected {}", describe(&other)), offset)),
        }
    }

    fn identifier(&mut self, name: String, offset: usize) -> Result<Expr, ParseError> {
        if self.eat(&Tok::LParen) {
            let mut args = Vec::new();
            if !self.eat(&Tok::RParen) {
                loop {
                    args.push(self.expression()?);
                    if self.eat(&Tok::RParen) {
                        break;
                    }
                    self.expect(&Tok::Comma, "',' or ')' in call")?;
                }
            }

            let lowered = name.to_ascii_lowercase();
            return match lowered.as_str() {
                "isset" | "empty" => {
                    let mut args = args.into_iter();
                    let (Some(target), None) = (args.next(), args.next()) else {
                        return Err(ParseError::new(
                            format!("{lowered}() takes exactly one argument"),
                            offset,
                        ));
                    };
                    let target = Box::new(target);
                    Ok(if lowered == "isset" {
                        Expr::Isset {
                            target,
                        }
                    } else {
                        Expr::Empty {
                            target,
                        }
                    })
                }
                _ => Ok(Expr::Call {
                    function: name,
                    args,
                }),
            };
        }

        match name.to_ascii_lowercase().as_str() {
            "true" => Ok(literal(Value::Bool(true))),
            "false" => Ok(literal(Value::Bool(false))),
            "null" => Ok(literal(Value::Null)),
            _ => Err(ParseError::new(
                format!("unknown identifier '{name}' (variables start with '$')"),
                offset,
            )),
        }
    }
}

fn literal(value: Value) -> Expr {
    Expr::Literal {
        value,
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Eof => "end of expression".to_string(),
        Tok::Variable(name) => format!("variable '${name}'"),
        Tok::Ident(name) => format!("'{name}'"),
        Tok::Int(n) => format!("number {n}"),
        Tok::Float(f) => format!("number {f}"),
        Tok::Str(_) => "string literal".to_string(),
        other => format!("token {other:?}"),
    }
}
