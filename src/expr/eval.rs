//! Expression evaluator.
//!
//! Evaluates [`Expr`] trees against the flat variable map of an executing
//! template. Values are plain [`serde_json::Value`]s.

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

use super::EvalError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions;

/// Variables visible to an executing template.
pub type Vars = Map<String, Value>;

/// Evaluate `expr`. Reading an undefined variable is an error.
pub fn evaluate(expr: &Expr, vars: &Vars) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal {
            value,
        } => Ok(value.clone()),
        Expr::Array {
            items,
        } => items.iter().map(|item| evaluate(item, vars)).collect::<Result<Vec<_>, _>>().map(Value::Array),
        Expr::Var {
            name,
        } => vars.get(name).cloned().ok_or_else(|| EvalError::Undefined(name.clone())),
        Expr::Member {
            target,
            field,
        } => member(evaluate(target, vars)?, field),
        Expr::Index {
            target,
            index,
        } => {
            let target = evaluate(target, vars)?;
            let index = evaluate(index, vars)?;
            index_value(target, &index)
        }
        Expr::Unary {
            op,
            operand,
        } => {
            let value = evaluate(operand, vars)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
                UnaryOp::Neg => match to_num(&value) {
                    Some(Num::Int(i)) => match i.checked_neg() {
                        Some(n) => Ok(Value::from(n)),
                        None => float(-(i as f64)),
                    },
                    Some(Num::Float(f)) => float(-f),
                    None => Err(EvalError::message(format!("cannot negate {}", type_name(&value)))),
                },
            }
        }
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => Ok(Value::Bool(is_truthy(&evaluate(left, vars)?) && is_truthy(&evaluate(right, vars)?))),
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => Ok(Value::Bool(is_truthy(&evaluate(left, vars)?) || is_truthy(&evaluate(right, vars)?))),
        Expr::Binary {
            op,
            left,
            right,
        } => {
            let left = evaluate(left, vars)?;
            let right = evaluate(right, vars)?;
            binary(*op, &left, &right)
        }
        Expr::Coalesce {
            left,
            right,
        } => match soft(left, vars)? {
            Some(value) if !value.is_null() => Ok(value),
            _ => evaluate(right, vars),
        },
        Expr::Ternary {
            test,
            then,
            otherwise,
        } => {
            let test = evaluate(test, vars)?;
            if is_truthy(&test) {
                match then {
                    Some(then) => evaluate(then, vars),
                    None => Ok(test),
                }
            } else {
                evaluate(otherwise, vars)
            }
        }
        Expr::Call {
            function,
            args,
        } => {
            let args = args.iter().map(|arg| evaluate(arg, vars)).collect::<Result<Vec<_>, _>>()?;
            functions::call(function, args)
        }
        Expr::Isset {
            target,
        } => Ok(Value::Bool(soft(target, vars)?.is_some_and(|v| !v.is_null()))),
        Expr::Empty {
            target,
        } => Ok(Value::Bool(!soft(target, vars)?.is_some_and(|v| is_truthy(&v)))),
    }
}

/// Evaluate without failing on undefined names; `None` means "not set".
fn soft(expr: &Expr, vars: &Vars) -> Result<Option<Value>, EvalError> {
    match expr {
        Expr::Var {
            name,
        } => Ok(vars.get(name).cloned()),
        Expr::Member {
            target,
            field,
        } => match soft(target, vars)? {
            Some(value) => member(value, field).map(Some).or(Ok(None)),
            None => Ok(None),
        },
        Expr::Index {
            target,
            index,
        } => match soft(target, vars)? {
            Some(value) => {
                let index = evaluate(index, vars)?;
                index_value(value, &index).map(Some).or(Ok(None))
            }
            None => Ok(None),
        },
        other => evaluate(other, vars).map(Some),
    }
}

fn member(target: Value, field: &str) -> Result<Value, EvalError> {
    match target {
        Value::Object(mut map) => Ok(map.remove(field).unwrap_or(Value::Null)),
        Value::Array(items) => match field.parse::<usize>() {
            Ok(i) => Ok(items.into_iter().nth(i).unwrap_or(Value::Null)),
            Err(_) => Err(EvalError::message(format!("cannot read field '{field}' of a list"))),
        },
        Value::Null => Ok(Value::Null),
        other => Err(EvalError::message(format!(
            "cannot read field '{field}' of {}",
            type_name(&other)
        ))),
    }
}

fn index_value(target: Value, index: &Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::Array(items), Value::Number(n)) => {
            let i = n
                .as_u64()
                .ok_or_else(|| EvalError::message(format!("invalid list index {n}")))?;
            Ok(usize::try_from(i).ok().and_then(|i| items.into_iter().nth(i)).unwrap_or(Value::Null))
        }
        (Value::Object(mut map), key) => Ok(map.remove(&to_output(key)).unwrap_or(Value::Null)),
        (Value::Null, _) => Ok(Value::Null),
        (target, index) => Err(EvalError::message(format!(
            "cannot index {} with {}",
            type_name(&target),
            type_name(index)
        ))),
    }
}

/// Apply a non-short-circuiting binary operator.
fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_eq(left, right))),
        BinaryOp::Identical => Ok(Value::Bool(left == right)),
        BinaryOp::NotIdentical => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => Ok(Value::Bool(compare(left, right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare(left, right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(left, right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(left, right)? != Ordering::Less)),
        BinaryOp::Add if left.is_string() || right.is_string() => {
            Ok(Value::String(format!("{}{}", to_output(left), to_output(right))))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
        BinaryOp::And => Ok(Value::Bool(is_truthy(left) && is_truthy(right))),
        BinaryOp::Or => Ok(Value::Bool(is_truthy(left) || is_truthy(right))),
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn to_num(value: &Value) -> Option<Num> {
    match value {
        Value::Number(n) => n.as_i64().map(Num::Int).or_else(|| n.as_f64().map(Num::Float)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Null => Some(Num::Int(0)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().map(Num::Int).ok().or_else(|| s.parse::<f64>().ok().map(Num::Float))
        }
        _ => None,
    }
}

fn float(f: f64) -> Result<Value, EvalError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EvalError::message("arithmetic result is not a finite number"))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(l), Some(r)) = (to_num(left), to_num(right)) else {
        return Err(EvalError::message(format!(
            "cannot apply {op:?} to {} and {}",
            type_name(left),
            type_name(right)
        )));
    };

    if let (Num::Int(a), Num::Int(b)) = (l, r) {
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(EvalError::message("division by zero"));
                }
                if a.checked_rem(b) == Some(0) { a.checked_div(b) } else { None }
            }
            BinaryOp::Rem => {
                if b == 0 {
                    return Err(EvalError::message("modulo by zero"));
                }
                a.checked_rem(b)
            }
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::from(n));
        }
    }

    let (a, b) = (l.as_f64(), r.as_f64());
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(EvalError::message("division by zero")),
        BinaryOp::Div => a / b,
        BinaryOp::Rem if b == 0.0 => return Err(EvalError::message("modulo by zero")),
        BinaryOp::Rem => a % b,
        other => return Err(EvalError::message(format!("{other:?} is not arithmetic"))),
    };
    float(result)
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    match (to_num(left), to_num(right)) {
        (Some(a), Some(b)) => match (a, b) {
            (Num::Int(a), Num::Int(b)) => Ok(a.cmp(&b)),
            (a, b) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .ok_or_else(|| EvalError::message("cannot order NaN")),
        },
        _ => Err(EvalError::message(format!(
            "cannot compare {} with {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

/// Loose equality: numbers compare numerically, numeric strings equal their
/// numbers, `null`/booleans compare by truthiness.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, other) | (other, Value::Null) => !is_truthy(other),
        (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == is_truthy(other),
        (Value::Number(_), Value::Number(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => match (to_num(left), to_num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => false,
        },
        _ => left == right,
    }
}

/// Truthiness used by conditionals and logical operators.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text written to the output for a value.
pub fn to_output(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Human-readable type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
