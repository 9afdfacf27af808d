//! Static checks for editor feedback. Nothing is evaluated.

use crate::ast::{Expr, LambdaBody, Program, Stmt};
use crate::helpers;
use crate::interpreter::{DENIED_MEMBERS, DENIED_NAMES};
use crate::parser::{parse_expression, parse_program};
use cueflow_core::error::{CueError, Result};
use std::collections::HashSet;

/// Validator with an optional set of extra callable names (host functions).
#[derive(Debug, Clone, Default)]
pub struct Validator {
    extra_functions: HashSet<String>,
}

impl Validator {
    /// Validator that knows only the helper library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept calls to these names.
    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_functions
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Check that an expression parses and stays inside the allowlist.
    pub fn validate_expression(&self, expression: &str) -> Result<()> {
        let expr = parse_expression(expression)?;
        let mut walk = Walk {
            validator: self,
            declared: HashSet::new(),
        };
        walk.expr(&expr)
    }

    /// Check that a script parses and stays inside the allowlist.
    pub fn validate_script(&self, script: &str) -> Result<()> {
        let program = parse_program(script)?;
        let mut walk = Walk {
            validator: self,
            declared: declared_names(&program),
        };
        for stmt in &program.body {
            walk.stmt(stmt)?;
        }
        Ok(())
    }
}

/// [`Validator::validate_expression`] with the default validator.
pub fn validate_expression(expression: &str) -> Result<()> {
    Validator::new().validate_expression(expression)
}

/// [`Validator::validate_script`] with the default validator.
pub fn validate_script(script: &str) -> Result<()> {
    Validator::new().validate_script(script)
}

/// Every name declared anywhere in the program. Scoping is ignored, which
/// keeps the check permissive.
fn declared_names(program: &Program) -> HashSet<String> {
    fn stmt(s: &Stmt, out: &mut HashSet<String>) {
        match s {
            Stmt::Declare { name, init, .. } => {
                out.insert(name.clone());
                if let Some(init) = init {
                    expr(init, out);
                }
            }
            Stmt::Expr(e) | Stmt::Throw(e) | Stmt::Return(Some(e)) => expr(e, out),
            Stmt::If {
                consequent,
                alternate,
                ..
            } => {
                stmt(consequent, out);
                if let Some(alternate) = alternate {
                    stmt(alternate, out);
                }
            }
            Stmt::While { body, .. } => stmt(body, out),
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    stmt(init, out);
                }
                stmt(body, out);
            }
            Stmt::ForOf { name, body, .. } | Stmt::ForIn { name, body, .. } => {
                out.insert(name.clone());
                stmt(body, out);
            }
            Stmt::Block(body) => body.iter().for_each(|s| stmt(s, out)),
            _ => {}
        }
    }
    fn expr(e: &Expr, out: &mut HashSet<String>) {
        match e {
            Expr::Arrow(lambda) => {
                out.extend(lambda.params.iter().cloned());
                match &lambda.body {
                    LambdaBody::Expr(body) => expr(body, out),
                    LambdaBody::Block(body) => body.iter().for_each(|s| stmt(s, out)),
                }
            }
            Expr::Call { callee, args } => {
                expr(callee, out);
                args.iter().for_each(|a| expr(a, out));
            }
            Expr::Assign { target, value, .. } => {
                if let Expr::Ident(name) = target.as_ref() {
                    out.insert(name.clone());
                }
                expr(value, out);
            }
            Expr::Array(items) => items.iter().for_each(|i| expr(i, out)),
            Expr::Object(entries) => entries.iter().for_each(|(_, v)| expr(v, out)),
            _ => {}
        }
    }

    let mut out = HashSet::new();
    program.body.iter().for_each(|s| stmt(s, &mut out));
    out
}

struct Walk<'v> {
    validator: &'v Validator,
    declared: HashSet<String>,
}

impl Walk<'_> {
    fn name(&self, name: &str) -> Result<()> {
        if DENIED_NAMES.contains(&name) {
            return Err(CueError::CapabilityDenied {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn member(&self, property: &str) -> Result<()> {
        if DENIED_MEMBERS.contains(&property) {
            return Err(CueError::CapabilityDenied {
                name: property.to_string(),
            });
        }
        Ok(())
    }

    fn callable(&self, name: &str) -> bool {
        helpers::is_known_function(name)
            || self.declared.contains(name)
            || self.validator.extra_functions.contains(name)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Declare { name, init, .. } => {
                self.name(name)?;
                if let Some(init) = init {
                    self.expr(init)?;
                }
                Ok(())
            }
            Stmt::Expr(e) | Stmt::Throw(e) | Stmt::Return(Some(e)) => self.expr(e),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test)?;
                self.stmt(consequent)?;
                if let Some(alternate) = alternate {
                    self.stmt(alternate)?;
                }
                Ok(())
            }
            Stmt::While { test, body } => {
                self.expr(test)?;
                self.stmt(body)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.stmt(init)?;
                }
                if let Some(test) = test {
                    self.expr(test)?;
                }
                if let Some(update) = update {
                    self.expr(update)?;
                }
                self.stmt(body)
            }
            Stmt::ForOf {
                name,
                iterable: target,
                body,
            }
            | Stmt::ForIn {
                name,
                object: target,
                body,
            } => {
                self.name(name)?;
                self.expr(target)?;
                self.stmt(body)
            }
            Stmt::Block(body) => body.iter().try_for_each(|s| self.stmt(s)),
            Stmt::Return(None) | Stmt::Break | Stmt::Continue | Stmt::Empty => Ok(()),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => Ok(()),
            Expr::Ident(name) => self.name(name),
            Expr::Array(items) => items.iter().try_for_each(|i| self.expr(i)),
            Expr::Object(entries) => entries.iter().try_for_each(|(_, v)| self.expr(v)),
            Expr::Member {
                object, property, ..
            } => {
                self.member(property)?;
                if let Expr::Ident(ns) = object.as_ref() {
                    if helpers::is_namespace(ns) && !self.declared.contains(ns) {
                        return Ok(());
                    }
                }
                self.expr(object)
            }
            Expr::Index { object, index, .. } => {
                if let Expr::Literal(Some(serde_json::Value::String(key))) = index.as_ref() {
                    self.member(key)?;
                }
                self.expr(object)?;
                self.expr(index)
            }
            Expr::Call { callee, args } => {
                if let Expr::Ident(name) = callee.as_ref() {
                    self.name(name)?;
                    if !self.callable(name) {
                        return Err(CueError::FunctionNotFound { name: name.clone() });
                    }
                } else {
                    self.expr(callee)?;
                }
                args.iter().try_for_each(|a| self.expr(a))
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test)?;
                self.expr(consequent)?;
                self.expr(alternate)
            }
            Expr::Arrow(lambda) => {
                for param in &lambda.params {
                    self.name(param)?;
                }
                match &lambda.body {
                    LambdaBody::Expr(body) => self.expr(body),
                    LambdaBody::Block(body) => body.iter().try_for_each(|s| self.stmt(s)),
                }
            }
            Expr::Assign { target, value, .. } => {
                self.expr(target)?;
                self.expr(value)
            }
            Expr::Update { target, .. } => self.expr(target),
        }
    }
}
