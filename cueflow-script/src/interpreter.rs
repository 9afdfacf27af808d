//! Tree-walking evaluator over the syntax tree.
//!
//! Values are JSON plus two extras the language needs: `undefined` and
//! arrow functions. Nothing outside the [`ExecutionContext`] and the helper
//! library is reachable; names on the deny list fail before lookup.

use crate::ast::{BinaryOp, DeclKind, Expr, Lambda, LambdaBody, LogicalOp, Program, Stmt, UnaryOp};
use crate::budget::{Budget, ScriptLimits};
use crate::helpers;
use crate::resolve::{ROOTS, root_value};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::value::{self, PathSegment};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// Globals that evaluated code may never reach.
pub const DENIED_NAMES: &[&str] = &[
    "window",
    "document",
    "fetch",
    "eval",
    "Function",
    "require",
    "process",
    "globalThis",
    "setTimeout",
    "setInterval",
    "XMLHttpRequest",
    "localStorage",
    "import",
];

/// Property names that may never be read or written.
pub const DENIED_MEMBERS: &[&str] = &["__proto__", "constructor", "prototype"];

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Val {
    /// `undefined`
    Undefined,
    /// Any JSON value.
    Json(Value),
    /// An arrow function.
    Func(Rc<Closure>),
}

/// An arrow function together with the bindings visible where it was
/// created. Bindings are captured by value.
#[derive(Debug)]
pub struct Closure {
    lambda: Rc<Lambda>,
    captured: HashMap<String, Val>,
}

impl Closure {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.lambda.params.len()
    }
}

impl From<Value> for Val {
    fn from(value: Value) -> Self {
        Val::Json(value)
    }
}

impl Val {
    /// Convert to JSON; `undefined` and functions become `null`.
    pub fn into_json(self) -> Value {
        match self {
            Val::Json(v) => v,
            Val::Undefined | Val::Func(_) => Value::Null,
        }
    }

    /// Borrow the JSON value, if this is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Val::Json(v) => Some(v),
            _ => None,
        }
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Val::Undefined | Val::Json(Value::Null))
    }

    /// Truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Val::Undefined => false,
            Val::Func(_) => true,
            Val::Json(v) => value::is_truthy(v),
        }
    }

    /// String form used by concatenation and `String()`.
    pub fn display(&self) -> String {
        match self {
            Val::Undefined => "undefined".to_string(),
            Val::Func(_) => "[function]".to_string(),
            Val::Json(v) => value::to_display_string(v),
        }
    }

    /// Numeric form; non-numeric values are NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Val::Json(Value::Null) => 0.0,
            Val::Json(Value::Bool(b)) => f64::from(u8::from(*b)),
            Val::Json(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Val::Json(Value::String(s)) if s.trim().is_empty() => 0.0,
            Val::Json(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    /// Result of `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Undefined => "undefined",
            Val::Func(_) => "function",
            Val::Json(Value::Bool(_)) => "boolean",
            Val::Json(Value::Number(_)) => "number",
            Val::Json(Value::String(_)) => "string",
            Val::Json(_) => "object",
        }
    }
}

/// Build a number value.
pub fn num(n: f64) -> Val {
    Val::Json(value::number(n))
}

struct Binding {
    value: Val,
    constant: bool,
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Val),
}

/// Evaluator state for one expression or script run.
pub struct Interpreter<'a> {
    ctx: &'a ExecutionContext,
    budget: Budget,
    scopes: Vec<HashMap<String, Binding>>,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    /// New interpreter with its clock started.
    pub fn new(ctx: &'a ExecutionContext, limits: ScriptLimits) -> Self {
        Self {
            ctx,
            budget: Budget::new(limits),
            scopes: vec![HashMap::new()],
            depth: 0,
        }
    }

    /// The execution context.
    pub fn ctx(&self) -> &'a ExecutionContext {
        self.ctx
    }

    /// Limits in force.
    pub fn limits(&self) -> &ScriptLimits {
        self.budget.limits()
    }

    /// Account for a loop iteration performed by a helper.
    pub fn iterate(&mut self) -> Result<()> {
        self.budget.iterate()
    }

    /// Bind a variable in the outermost scope.
    pub fn bind(&mut self, name: impl Into<String>, value: Val) {
        if let Some(scope) = self.scopes.first_mut() {
            scope.insert(
                name.into(),
                Binding {
                    value,
                    constant: false,
                },
            );
        }
    }

    /// Run a script; the result is the `return` value or the value of the
    /// last expression statement.
    pub fn run_program(&mut self, program: &Program) -> Result<Val> {
        let mut last = Val::Undefined;
        for stmt in &program.body {
            match self.exec(stmt, &mut last)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value),
                Flow::Break | Flow::Continue => {
                    return Err(CueError::script("'break' or 'continue' outside a loop"));
                }
            }
        }
        Ok(last)
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn declare(&mut self, name: &str, value: Val, constant: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Binding { value, constant });
        }
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn binding_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }

    pub(crate) fn is_bound(&self, name: &str) -> bool {
        self.binding(name).is_some() || self.ctx.local(name).is_some()
    }

    fn lookup(&self, name: &str) -> Result<Val> {
        if DENIED_NAMES.contains(&name) {
            return Err(CueError::CapabilityDenied {
                name: name.to_string(),
            });
        }
        if let Some(binding) = self.binding(name) {
            return Ok(binding.value.clone());
        }
        root_value(name, self.ctx)
            .map(Val::Json)
            .ok_or_else(|| CueError::script(format!("'{}' is not defined", name)))
    }

    /// Fail if a string of `len` bytes would exceed the size cap.
    pub fn check_string_len(&self, len: usize) -> Result<()> {
        if len > self.limits().max_string_len {
            return Err(CueError::script(format!(
                "string longer than {} bytes",
                self.limits().max_string_len
            )));
        }
        Ok(())
    }

    /// Fail if an array would exceed the collection cap.
    pub fn check_collection(&self, len: usize) -> Result<()> {
        if len > self.limits().max_collection_len {
            return Err(CueError::script(format!(
                "array longer than {} items",
                self.limits().max_collection_len
            )));
        }
        Ok(())
    }

    // Statements

    fn exec_body(&mut self, stmts: &[Stmt], last: &mut Val) -> Result<Flow> {
        for stmt in stmts {
            match self.exec(stmt, last)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn loop_body(&mut self, body: &Stmt, last: &mut Val) -> Result<Option<Flow>> {
        match self.exec(body, last)? {
            Flow::Break => Ok(Some(Flow::Normal)),
            Flow::Return(value) => Ok(Some(Flow::Return(value))),
            Flow::Normal | Flow::Continue => Ok(None),
        }
    }

    fn exec(&mut self, stmt: &Stmt, last: &mut Val) -> Result<Flow> {
        self.budget.tick()?;
        match stmt {
            Stmt::Empty => Ok(Flow::Normal),
            Stmt::Expr(expr) => {
                *last = self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Declare { kind, name, init } => {
                if DENIED_NAMES.contains(&name.as_str()) {
                    return Err(CueError::CapabilityDenied { name: name.clone() });
                }
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Val::Undefined,
                };
                self.declare(name, value, *kind == DeclKind::Const);
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => self.with_scope(|this| this.exec_body(stmts, last)),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.exec(consequent, last)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, last)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { test, body } => {
                loop {
                    self.budget.iterate()?;
                    if !self.eval(test)?.truthy() {
                        return Ok(Flow::Normal);
                    }
                    if let Some(flow) = self.loop_body(body, last)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.with_scope(|this| {
                if let Some(init) = init {
                    this.exec(init, last)?;
                }
                loop {
                    this.budget.iterate()?;
                    if let Some(test) = test {
                        if !this.eval(test)?.truthy() {
                            return Ok(Flow::Normal);
                        }
                    }
                    if let Some(flow) = this.loop_body(body, last)? {
                        return Ok(flow);
                    }
                    if let Some(update) = update {
                        this.eval(update)?;
                    }
                }
            }),
            Stmt::ForOf {
                name,
                iterable,
                body,
            } => {
                let items: Vec<Value> = match self.eval(iterable)? {
                    Val::Json(Value::Array(items)) => items,
                    Val::Json(Value::String(s)) => {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    }
                    other => {
                        return Err(CueError::script(format!(
                            "{} is not iterable",
                            other.type_name()
                        )));
                    }
                };
                self.iterate_bound(name, items, body, last)
            }
            Stmt::ForIn { name, object, body } => {
                let keys: Vec<Value> = match self.eval(object)? {
                    Val::Json(Value::Object(map)) => {
                        map.keys().map(|k| Value::String(k.clone())).collect()
                    }
                    Val::Json(Value::Array(items)) => (0..items.len())
                        .map(|i| Value::String(i.to_string()))
                        .collect(),
                    _ => Vec::new(),
                };
                self.iterate_bound(name, keys, body, last)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Val::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Throw(expr) => {
                let value = self.eval(expr)?;
                Err(CueError::script(value.display()))
            }
        }
    }

    fn iterate_bound(
        &mut self,
        name: &str,
        items: Vec<Value>,
        body: &Stmt,
        last: &mut Val,
    ) -> Result<Flow> {
        for item in items {
            self.budget.iterate()?;
            let flow = self.with_scope(|this| {
                this.declare(name, Val::Json(item), false);
                this.loop_body(body, last)
            })?;
            if let Some(flow) = flow {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    // Expressions

    /// Evaluate an expression.
    pub fn eval(&mut self, expr: &Expr) -> Result<Val> {
        self.budget.tick()?;
        match expr {
            Expr::Literal(Some(value)) => Ok(Val::Json(value.clone())),
            Expr::Literal(None) => Ok(Val::Undefined),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => {
                self.check_collection(items.len())?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?.into_json());
                }
                Ok(Val::Json(Value::Array(out)))
            }
            Expr::Object(entries) => {
                let mut map = Map::new();
                for (key, expr) in entries {
                    map.insert(key.clone(), self.eval(expr)?.into_json());
                }
                Ok(Val::Json(Value::Object(map)))
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                check_member(property)?;
                if let Expr::Ident(ns) = object.as_ref() {
                    if !self.is_bound(ns) && helpers::is_namespace(ns) {
                        return helpers::namespace_constant(ns, property)
                            .map(Val::Json)
                            .ok_or_else(|| {
                                CueError::script(format!("'{}.{}' is not a value", ns, property))
                            });
                    }
                }
                let target = self.eval(object)?;
                if *optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                Ok(get_property(&target, property))
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let target = self.eval(object)?;
                if *optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                let key = self.eval(index)?;
                let key = match key {
                    Val::Json(Value::Number(n)) => n.to_string(),
                    other => other.display(),
                };
                check_member(&key)?;
                Ok(get_property(&target, &key))
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Val::Json(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => num(-value.to_number()),
                    UnaryOp::Plus => num(value.to_number()),
                    UnaryOp::TypeOf => Val::Json(Value::String(value.type_name().to_string())),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, left, right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Arrow(lambda) => Ok(Val::Func(Rc::new(Closure {
                lambda: lambda.clone(),
                captured: self.capture(),
            }))),
            Expr::Assign { target, op, value } => {
                let mut new_value = self.eval(value)?;
                if let Some(op) = op {
                    let current = self.eval(target)?;
                    new_value = self.binary(*op, current, new_value)?;
                }
                self.assign(target, new_value.clone())?;
                Ok(new_value)
            }
            Expr::Update {
                target,
                increment,
                prefix,
            } => {
                let old = self.eval(target)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.assign(target, num(new))?;
                Ok(num(if *prefix { new } else { old }))
            }
        }
    }

    fn binary(&self, op: BinaryOp, left: Val, right: Val) -> Result<Val> {
        Ok(match op {
            BinaryOp::Add => {
                let concat = matches!(left, Val::Json(Value::String(_)))
                    || matches!(right, Val::Json(Value::String(_)))
                    || matches!(left, Val::Json(Value::Array(_) | Value::Object(_)))
                    || matches!(right, Val::Json(Value::Array(_) | Value::Object(_)));
                if concat {
                    let (left, right) = (left.display(), right.display());
                    self.check_string_len(left.len().saturating_add(right.len()))?;
                    Val::Json(Value::String(left + &right))
                } else {
                    num(left.to_number() + right.to_number())
                }
            }
            BinaryOp::Sub => num(left.to_number() - right.to_number()),
            BinaryOp::Mul => num(left.to_number() * right.to_number()),
            BinaryOp::Div => num(left.to_number() / right.to_number()),
            BinaryOp::Rem => num(left.to_number() % right.to_number()),
            BinaryOp::LooseEq => Val::Json(Value::Bool(loose_equals(&left, &right))),
            BinaryOp::LooseNe => Val::Json(Value::Bool(!loose_equals(&left, &right))),
            BinaryOp::StrictEq => Val::Json(Value::Bool(strict_equals(&left, &right))),
            BinaryOp::StrictNe => Val::Json(Value::Bool(!strict_equals(&left, &right))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                Val::Json(Value::Bool(compare(op, &left, &right)))
            }
        })
    }

    fn capture(&self) -> HashMap<String, Val> {
        let mut captured = HashMap::new();
        for scope in &self.scopes {
            for (name, binding) in scope {
                captured.insert(name.clone(), binding.value.clone());
            }
        }
        captured
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Val>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(self.eval(arg)?);
        }
        Ok(out)
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Val> {
        match callee {
            Expr::Ident(name) => {
                if DENIED_NAMES.contains(&name.as_str()) {
                    return Err(CueError::CapabilityDenied { name: name.clone() });
                }
                let args = self.eval_args(args)?;
                if self.is_bound(name) {
                    let function = self.lookup(name)?;
                    return self.call_value(&function, args);
                }
                if let Some(result) = helpers::call_function(self, name, args.clone())? {
                    return Ok(result);
                }
                if self.ctx.functions().contains(name) {
                    let json: Vec<Value> = args.into_iter().map(Val::into_json).collect();
                    return self.ctx.functions().call(name, &json).map(Val::Json);
                }
                Err(CueError::FunctionNotFound { name: name.clone() })
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                check_member(property)?;
                if let Expr::Ident(ns) = object.as_ref() {
                    if !self.is_bound(ns) && helpers::is_namespace(ns) {
                        let args = self.eval_args(args)?;
                        return helpers::call_namespaced(self, ns, property, args);
                    }
                }
                if property == "push" && !*optional {
                    return self.push(object, args);
                }
                let receiver = self.eval(object)?;
                if *optional && receiver.is_nullish() {
                    return Ok(Val::Undefined);
                }
                let args = self.eval_args(args)?;
                helpers::call_method(self, receiver, property, args)
            }
            other => {
                let function = self.eval(other)?;
                let args = self.eval_args(args)?;
                self.call_value(&function, args)
            }
        }
    }

    /// `list.push(x)` writes the extended array back to `list`.
    fn push(&mut self, object: &Expr, args: &[Expr]) -> Result<Val> {
        let Val::Json(Value::Array(mut items)) = self.eval(object)? else {
            return Err(CueError::script("push() needs an array"));
        };
        for value in self.eval_args(args)? {
            items.push(value.into_json());
        }
        self.check_collection(items.len())?;
        let len = items.len();
        self.assign(object, Val::Json(Value::Array(items)))?;
        Ok(num(len as f64))
    }

    /// Call a function value with already-evaluated arguments.
    pub fn call_value(&mut self, function: &Val, args: Vec<Val>) -> Result<Val> {
        let Val::Func(closure) = function else {
            return Err(CueError::script(format!(
                "{} is not a function",
                function.type_name()
            )));
        };

        let limit = self.limits().max_call_depth;
        if self.depth >= limit {
            return Err(CueError::CallDepthExceeded { limit });
        }

        let mut frame: HashMap<String, Binding> = closure
            .captured
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    Binding {
                        value: value.clone(),
                        constant: false,
                    },
                )
            })
            .collect();
        let mut args = args.into_iter();
        for param in &closure.lambda.params {
            frame.insert(
                param.clone(),
                Binding {
                    value: args.next().unwrap_or(Val::Undefined),
                    constant: false,
                },
            );
        }

        let saved = std::mem::replace(&mut self.scopes, vec![frame]);
        self.depth += 1;
        let result = match &closure.lambda.body {
            LambdaBody::Expr(expr) => self.eval(expr),
            LambdaBody::Block(stmts) => {
                let mut last = Val::Undefined;
                match self.exec_body(stmts, &mut last) {
                    Ok(Flow::Return(value)) => Ok(value),
                    Ok(Flow::Normal) => Ok(Val::Undefined),
                    Ok(Flow::Break | Flow::Continue) => {
                        Err(CueError::script("'break' or 'continue' outside a loop"))
                    }
                    Err(e) => Err(e),
                }
            }
        };
        self.depth -= 1;
        self.scopes = saved;
        result
    }

    fn assign(&mut self, target: &Expr, value: Val) -> Result<()> {
        if let Expr::Ident(name) = target {
            if let Some(binding) = self.binding_mut(name) {
                if binding.constant {
                    return Err(CueError::script(format!(
                        "assignment to constant '{}'",
                        name
                    )));
                }
                binding.value = value;
                return Ok(());
            }
            check_writable_root(name, self.ctx)?;
            if DENIED_NAMES.contains(&name.as_str()) {
                return Err(CueError::CapabilityDenied { name: name.clone() });
            }
            // Undeclared names become script globals
            if let Some(scope) = self.scopes.first_mut() {
                scope.insert(
                    name.clone(),
                    Binding {
                        value,
                        constant: false,
                    },
                );
            }
            return Ok(());
        }

        let mut segments = Vec::new();
        let root = self.assignment_path(target, &mut segments)?;
        if self.binding(&root).is_none() {
            check_writable_root(&root, self.ctx)?;
            return Err(CueError::script(format!("'{}' is not defined", root)));
        }
        let Val::Json(stored) = value else {
            return Err(CueError::script("only data values can be stored in objects"));
        };
        let Some(binding) = self.binding_mut(&root) else {
            return Err(CueError::script(format!("'{}' is not defined", root)));
        };
        match &mut binding.value {
            Val::Json(container @ (Value::Object(_) | Value::Array(_))) => {
                value::set_in_place(container, &segments, stored);
                Ok(())
            }
            other => Err(CueError::script(format!(
                "cannot set a property on {}",
                other.type_name()
            ))),
        }
    }

    fn assignment_path(&mut self, target: &Expr, segments: &mut Vec<PathSegment>) -> Result<String> {
        match target {
            Expr::Ident(name) => Ok(name.clone()),
            Expr::Member {
                object, property, ..
            } => {
                check_member(property)?;
                let root = self.assignment_path(object, segments)?;
                segments.push(PathSegment::Key(property.clone()));
                Ok(root)
            }
            Expr::Index { object, index, .. } => {
                let root = self.assignment_path(object, segments)?;
                let segment = match self.eval(index)? {
                    Val::Json(Value::Number(n)) => match n.as_u64() {
                        Some(i) => PathSegment::Index(i as usize),
                        None => return Err(CueError::script(format!("invalid index {}", n))),
                    },
                    other => {
                        let key = other.display();
                        check_member(&key)?;
                        PathSegment::Key(key)
                    }
                };
                segments.push(segment);
                Ok(root)
            }
            _ => Err(CueError::script("invalid assignment target")),
        }
    }
}

fn check_member(name: &str) -> Result<()> {
    if DENIED_MEMBERS.contains(&name) {
        return Err(CueError::CapabilityDenied {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_writable_root(name: &str, ctx: &ExecutionContext) -> Result<()> {
    if ROOTS.contains(&name) || ctx.local(name).is_some() {
        return Err(CueError::script(format!(
            "'{}' is read-only; use setState() to change state",
            name
        )));
    }
    Ok(())
}

/// Read a property without failing; missing values are `undefined`.
pub fn get_property(target: &Val, property: &str) -> Val {
    let Val::Json(value) = target else {
        return Val::Undefined;
    };
    match value {
        Value::Object(map) => map.get(property).cloned().map(Val::Json).unwrap_or(Val::Undefined),
        Value::Array(items) => {
            if property == "length" {
                return num(items.len() as f64);
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .map(Val::Json)
                .unwrap_or(Val::Undefined)
        }
        Value::String(s) => {
            if property == "length" {
                return num(s.chars().count() as f64);
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Val::Json(Value::String(c.to_string())))
                .unwrap_or(Val::Undefined)
        }
        _ => Val::Undefined,
    }
}

/// `==`: `null == undefined`, numbers compare with numeric strings and booleans.
pub fn loose_equals(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (l, r) if l.is_nullish() || r.is_nullish() => l.is_nullish() && r.is_nullish(),
        (Val::Json(Value::String(a)), Val::Json(Value::String(b))) => a == b,
        (
            Val::Json(Value::Number(_) | Value::Bool(_)),
            Val::Json(Value::String(_) | Value::Number(_) | Value::Bool(_)),
        )
        | (Val::Json(Value::String(_)), Val::Json(Value::Number(_) | Value::Bool(_))) => {
            let (a, b) = (left.to_number(), right.to_number());
            !a.is_nan() && a == b
        }
        _ => strict_equals(left, right),
    }
}

/// `===`: same type and value; functions compare by identity.
pub fn strict_equals(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (Val::Undefined, Val::Undefined) => true,
        (Val::Func(a), Val::Func(b)) => Rc::ptr_eq(a, b),
        (Val::Json(a), Val::Json(b)) => value::values_equal(a, b),
        _ => false,
    }
}

/// Relational comparison: two strings compare lexically, anything else
/// numerically, and a non-numeric side makes the result false.
pub fn compare(op: BinaryOp, left: &Val, right: &Val) -> bool {
    let ordering = match (left, right) {
        (Val::Json(Value::String(a)), Val::Json(Value::String(b))) => a.partial_cmp(b),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => false,
    }
}
