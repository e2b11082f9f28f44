//! Template expression language.
//!
//! Echoes (`{{ ... }}`) and directive arguments (`@if(...)`, `@foreach(...)`)
//! contain expressions. They are parsed once at compile time and stored in the
//! compiled artifact as [`Expr`] trees, then evaluated at render time against
//! the template's variables.
//!
//! # Syntax
//!
//! ```text
//! $user->name            member access (also $user.name)
//! $items[0]              indexing
//! 'a' + $b               string concat; numeric add for numbers
//! $x ?? 'default'        null coalescing
//! isset($x) ? $x : 'y'   conditional, with the isset/empty special forms
//! count($items) > 1      builtin calls
//! ```
//!
//! Loop headers have their own entry points: [`parse_foreach`] and
//! [`parse_for`].

pub mod ast;
pub mod eval;
pub mod functions;
mod lexer;
pub mod parser;

use thiserror::Error;

pub use ast::{Assignment, BinaryOp, Expr, ForEachHeader, ForHeader, UnaryOp};
pub use eval::{Vars, evaluate, is_truthy, to_output};
pub use functions::{BUILTINS, html_escape};
pub use parser::{parse_arguments, parse_expression, parse_for, parse_foreach};

/// Syntax error inside an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at column {})", offset + 1)]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// Byte offset into the expression source
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A `$variable` is not defined
    #[error("undefined variable '${0}'")]
    Undefined(String),
    /// No builtin with this name
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// Type or arithmetic error
    #[error("{0}")]
    Message(String),
}

impl EvalError {
    pub(crate) fn message(message: impl Into<String>) -> Self {
        EvalError::Message(message.into())
    }
}
