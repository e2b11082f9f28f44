//! Expression syntax tree.
//!
//! These types are stored inside compiled artifacts, so every change to their
//! serialized shape must bump [`crate::compiler::program::ARTIFACT_FORMAT`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed template expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Literal scalar value
    Literal {
        value: Value,
    },
    /// Array literal `[a, b]`
    Array {
        items: Vec<Expr>,
    },
    /// `$name`
    Var {
        name: String,
    },
    /// `target.field` or `target->field`
    Member {
        target: Box<Expr>,
        field: String,
    },
    /// `target[index]`
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `left ?? right`
    Coalesce {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `test ? then : otherwise`; `test ?: otherwise` leaves `then` empty
    Ternary {
        test: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
    /// Call to a builtin function
    Call {
        function: String,
        args: Vec<Expr>,
    },
    /// `isset(target)`: defined and not null
    Isset {
        target: Box<Expr>,
    },
    /// `empty(target)`: undefined or falsy
    Empty {
        target: Box<Expr>,
    },
}

impl Expr {
    /// Literal string expression.
    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal {
            value: Value::String(text.into()),
        }
    }

    /// Logical negation of `self`.
    pub fn negate(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Assignment statements allowed in `@for` headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    Set {
        name: String,
        value: Expr,
    },
    AddAssign {
        name: String,
        value: Expr,
    },
    SubAssign {
        name: String,
        value: Expr,
    },
    Increment {
        name: String,
    },
    Decrement {
        name: String,
    },
}

/// Header of a `@foreach`: `source as $value` or `source as $key => $value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachHeader {
    pub source: Expr,
    pub key: Option<String>,
    pub value: String,
}

/// Header of a C-style `@for`: `init; condition; step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForHeader {
    pub init: Vec<Assignment>,
    pub condition: Option<Expr>,
    pub step: Vec<Assignment>,
}
