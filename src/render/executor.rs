//! Program execution.
//!
//! Walks a compiled [`Node`] tree against the template variables, writing
//! output to the innermost open capture of the [`RenderSession`].

use serde_json::Value;

use super::session::RenderSession;
use crate::compiler::{EndMode, Node};
use crate::core::{Result, ViewError};
use crate::expr::{
    Assignment, BUILTINS, BinaryOp, EvalError, Expr, ForEachHeader, ForHeader, Vars, evaluate,
    html_escape, is_truthy, to_output,
};

/// Where errors are attributed while executing one template.
#[derive(Clone, Copy)]
struct Site<'a> {
    template: &'a str,
    line: usize,
}

impl Site<'_> {
    fn eval(self, expr: &Expr, vars: &Vars) -> Result<Value> {
        evaluate(expr, vars).map_err(|e| self.error(e, vars))
    }

    fn error(self, error: EvalError, vars: &Vars) -> ViewError {
        let template = self.template.to_string();
        let line = self.line;
        match error {
            EvalError::Undefined(variable) => ViewError::UndefinedVariable {
                suggestions: similar(&variable, vars.keys().map(String::as_str)),
                template,
                line,
                variable,
            },
            EvalError::UnknownFunction(function) => {
                let hint = similar(&function, BUILTINS.iter().copied());
                let message = match hint.first() {
                    Some(close) => format!("unknown function '{function}', did you mean '{close}'?"),
                    None => format!("unknown function '{function}'"),
                };
                ViewError::Evaluation {
                    template,
                    line,
                    message,
                }
            }
            EvalError::Message(message) => ViewError::Evaluation {
                template,
                line,
                message,
            },
        }
    }

    /// Evaluate an expression that names a template or block.
    fn name(self, expr: &Expr, vars: &Vars) -> Result<String> {
        match self.eval(expr, vars)? {
            Value::String(name) => Ok(name),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ViewError::Evaluation {
                template: self.template.to_string(),
                line: self.line,
                message: format!("expected a name, found {}", crate::expr::eval::type_name(&other)),
            }),
        }
    }

    fn malformed(self, message: &str) -> ViewError {
        ViewError::MalformedDirective {
            template: self.template.to_string(),
            line: self.line,
            message: message.to_string(),
        }
    }
}

/// Candidates within a small edit distance of `name`, closest first.
fn similar<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let threshold = (name.len() / 3).clamp(1, 3);
    let mut close: Vec<(usize, &str)> = candidates
        .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    close.sort();
    close.into_iter().take(3).map(|(_, c)| c.to_string()).collect()
}

impl RenderSession<'_> {
    /// Execute `nodes` for `template`. Captures at or below `floor` belong to
    /// the caller and cannot be closed from here.
    pub(super) fn execute(
        &mut self,
        template: &str,
        nodes: &[Node],
        vars: &mut Vars,
        floor: usize,
    ) -> Result<()> {
        for node in nodes {
            self.node(template, node, vars, floor)?;
        }
        Ok(())
    }

    fn node(&mut self, template: &str, node: &Node, vars: &mut Vars, floor: usize) -> Result<()> {
        match node {
            Node::Text {
                text,
            } => self.write(text),
            Node::Comment {
                ..
            } => {}
            Node::Echo {
                expr,
                line,
            } => {
                let value = Site {
                    template,
                    line: *line,
                }
                .eval(expr, vars)?;
                self.write(&to_output(&value));
            }
            Node::Conditional {
                branches,
                otherwise,
                line,
            } => {
                let site = Site {
                    template,
                    line: *line,
                };
                let mut taken = None;
                for branch in branches {
                    if is_truthy(&site.eval(&branch.test, vars)?) {
                        taken = Some(&branch.body);
                        break;
                    }
                }
                if let Some(body) = taken.or(otherwise.as_ref()) {
                    self.execute(template, body, vars, floor)?;
                }
            }
            Node::ForEach {
                header,
                body,
                line,
            } => self.foreach(template, *line, header, body, vars, floor)?,
            Node::For {
                header,
                body,
                line,
            } => self.for_loop(template, *line, header, body, vars, floor)?,
            Node::While {
                test,
                body,
                line,
            } => {
                let site = Site {
                    template,
                    line: *line,
                };
                let mut guard = LoopGuard::new(site, self.renderer.config().max_loop_iterations);
                while is_truthy(&site.eval(test, vars)?) {
                    guard.tick()?;
                    self.execute(template, body, vars, floor)?;
                }
            }
            Node::Extends {
                template: parent,
                line,
            } => {
                let parent = Site {
                    template,
                    line: *line,
                }
                .name(parent, vars)?;
                if self.include_depth > 0 {
                    tracing::warn!(
                        "Ignoring @extends('{parent}') in included template '{template}'"
                    );
                } else {
                    self.extend(parent);
                }
            }
            Node::Include {
                template: included,
                line,
            } => {
                let included = Site {
                    template,
                    line: *line,
                }
                .name(included, vars)?;
                self.include_vars(&included, vars)?;
            }
            Node::Yield {
                block,
                default,
                line,
            } => {
                let site = Site {
                    template,
                    line: *line,
                };
                let name = site.name(block, vars)?;
                let default = match default {
                    Some(expr) => to_output(&site.eval(expr, vars)?),
                    None => String::new(),
                };
                let text = self.block(&name, &default)?;
                self.write(&text);
            }
            Node::Section {
                block,
                inline,
                line,
            } => {
                let site = Site {
                    template,
                    line: *line,
                };
                let name = site.name(block, vars)?;
                match inline {
                    Some(expr) => {
                        let value = html_escape(&to_output(&site.eval(expr, vars)?));
                        self.begin(name);
                        self.write(&value);
                        self.end(false)?;
                    }
                    None => self.begin(name),
                }
            }
            Node::EndSection {
                mode,
                line,
            } => {
                if self.stack.len() <= floor {
                    let site = Site {
                        template,
                        line: *line,
                    };
                    return Err(site.malformed("no open @section to close"));
                }
                let name = self.end(*mode == EndMode::Overwrite)?;
                if *mode == EndMode::Show {
                    let text = self.block(&name, "")?;
                    self.write(&text);
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn foreach(
        &mut self,
        template: &str,
        line: usize,
        header: &ForEachHeader,
        body: &[Node],
        vars: &mut Vars,
        floor: usize,
    ) -> Result<()> {
        let site = Site {
            template,
            line,
        };
        let items: Vec<(Value, Value)> = match site.eval(&header.source, vars)? {
            Value::Array(items) => {
                items.into_iter().enumerate().map(|(i, v)| (Value::from(i), v)).collect()
            }
            Value::Object(map) => map.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(ViewError::Evaluation {
                    template: template.to_string(),
                    line,
                    message: format!(
                        "cannot iterate over {}",
                        crate::expr::eval::type_name(&other)
                    ),
                });
            }
        };

        let mut guard = LoopGuard::new(site, self.renderer.config().max_loop_iterations);
        for (key, value) in items {
            guard.tick()?;
            if let Some(key_name) = &header.key {
                vars.insert(key_name.clone(), key);
            }
            vars.insert(header.value.clone(), value);
            self.execute(template, body, vars, floor)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn for_loop(
        &mut self,
        template: &str,
        line: usize,
        header: &ForHeader,
        body: &[Node],
        vars: &mut Vars,
        floor: usize,
    ) -> Result<()> {
        let site = Site {
            template,
            line,
        };
        assign_all(site, &header.init, vars)?;

        let mut guard = LoopGuard::new(site, self.renderer.config().max_loop_iterations);
        loop {
            if let Some(condition) = &header.condition
                && !is_truthy(&site.eval(condition, vars)?)
            {
                break;
            }
            guard.tick()?;
            self.execute(template, body, vars, floor)?;
            assign_all(site, &header.step, vars)?;
        }
        Ok(())
    }
}

fn assign_all(site: Site<'_>, assignments: &[Assignment], vars: &mut Vars) -> Result<()> {
    for assignment in assignments {
        let (name, value) = match assignment {
            Assignment::Set {
                name,
                value,
            } => (name, site.eval(value, vars)?),
            Assignment::AddAssign {
                name,
                value,
            } => (name, site.eval(&update(name, BinaryOp::Add, value.clone()), vars)?),
            Assignment::SubAssign {
                name,
                value,
            } => (name, site.eval(&update(name, BinaryOp::Sub, value.clone()), vars)?),
            Assignment::Increment {
                name,
            } => (name, site.eval(&update(name, BinaryOp::Add, one()), vars)?),
            Assignment::Decrement {
                name,
            } => (name, site.eval(&update(name, BinaryOp::Sub, one()), vars)?),
        };
        vars.insert(name.clone(), value);
    }
    Ok(())
}

/// `$name <op> value`
fn update(name: &str, op: BinaryOp, value: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(Expr::Var {
            name: name.to_string(),
        }),
        right: Box::new(value),
    }
}

fn one() -> Expr {
    Expr::Literal {
        value: Value::from(1),
    }
}

/// Counts iterations of one loop against the configured cap.
struct LoopGuard<'a> {
    site: Site<'a>,
    limit: usize,
    count: usize,
}

impl<'a> LoopGuard<'a> {
    fn new(site: Site<'a>, limit: usize) -> Self {
        Self {
            site,
            limit,
            count: 0,
        }
    }

    fn tick(&mut self) -> Result<()> {
        self.count += 1;
        if self.count > self.limit {
            return Err(ViewError::LoopLimitExceeded {
                template: self.site.template.to_string(),
                line: self.site.line,
                limit: self.limit,
            });
        }
        Ok(())
    }
}
