//! Builtin functions callable from template expressions.

use serde_json::Value;

use super::EvalError;
use super::eval::{is_truthy, to_output};

/// Names of every builtin, used for "did you mean" hints.
pub const BUILTINS: &[&str] =
    &["e", "count", "length", "upper", "lower", "trim", "join", "json", "range", "default"];

/// Largest range the `range` builtin will materialize.
const MAX_RANGE_LEN: u64 = 100_000;

/// HTML-entity-encode text, quotes included.
///
/// ```rust
/// assert_eq!(vellum::expr::html_escape("<a href='x'>"), "&lt;a href=&#039;x&#039;&gt;");
/// ```
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn call(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    let lowered = name.to_ascii_lowercase();
    match lowered.as_str() {
        "e" => {
            let [value] = exact::<1>(name, args)?;
            Ok(Value::String(html_escape(&to_output(&value))))
        }
        "count" | "length" => {
            let [value] = exact::<1>(name, args)?;
            let len = match &value {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                Value::String(s) => s.chars().count(),
                Value::Null => 0,
                other => {
                    return Err(EvalError::message(format!(
                        "{name}() expects a list, object or string, got {}",
                        super::eval::type_name(other)
                    )));
                }
            };
            Ok(Value::from(len))
        }
        "upper" => {
            let [value] = exact::<1>(name, args)?;
            Ok(Value::String(to_output(&value).to_uppercase()))
        }
        "lower" => {
            let [value] = exact::<1>(name, args)?;
            Ok(Value::String(to_output(&value).to_lowercase()))
        }
        "trim" => {
            let [value] = exact::<1>(name, args)?;
            Ok(Value::String(to_output(&value).trim().to_string()))
        }
        "join" => {
            if args.is_empty() || args.len() > 2 {
                return Err(EvalError::message(format!("{name}() takes 1 or 2 arguments")));
            }
            let mut args = args.into_iter();
            let list = args.next().unwrap_or(Value::Null);
            let separator = args.next().map(|v| to_output(&v)).unwrap_or_default();
            let Value::Array(items) = list else {
                return Err(EvalError::message(format!("{name}() expects a list")));
            };
            let parts: Vec<String> = items.iter().map(to_output).collect();
            Ok(Value::String(parts.join(&separator)))
        }
        "json" => {
            let [value] = exact::<1>(name, args)?;
            serde_json::to_string(&value)
                .map(Value::String)
                .map_err(|e| EvalError::message(format!("json() failed: {e}")))
        }
        "range" => {
            let [start, end] = exact::<2>(name, args)?;
            let (Some(start), Some(end)) = (start.as_i64(), end.as_i64()) else {
                return Err(EvalError::message("range() expects two integers"));
            };
            if end.abs_diff(start) >= MAX_RANGE_LEN {
                return Err(EvalError::message(format!(
                    "range() is limited to {MAX_RANGE_LEN} items"
                )));
            }
            let items: Vec<Value> = if start <= end {
                (start..=end).map(Value::from).collect()
            } else {
                (end..=start).rev().map(Value::from).collect()
            };
            Ok(Value::Array(items))
        }
        "default" => {
            let [value, fallback] = exact::<2>(name, args)?;
            Ok(if is_truthy(&value) {
                value
            } else {
                fallback
            })
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    let count = args.len();
    args.try_into().map_err(|_| {
        EvalError::message(format!(
            "{name}() takes {N} argument{}, got {count}",
            if N == 1 { "" } else { "s" }
        ))
    })
}
