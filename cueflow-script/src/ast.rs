//! Syntax tree for expressions and scripts.

use serde_json::Value;
use std::rc::Rc;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `typeof`
    TypeOf,
}

/// Arithmetic, comparison and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

/// Arrow function.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Parameter names.
    pub params: Vec<String>,
    /// Body.
    pub body: LambdaBody,
}

/// Arrow function body.
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    /// `x => expr`
    Expr(Box<Expr>),
    /// `x => { ... }`
    Block(Vec<Stmt>),
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value; `None` is `undefined`.
    Literal(Option<Value>),
    /// Variable or root reference.
    Ident(String),
    /// `[a, b]`
    Array(Vec<Expr>),
    /// `{k: v}`
    Object(Vec<(String, Expr)>),
    /// `obj.prop` / `obj?.prop`
    Member {
        /// Receiver.
        object: Box<Expr>,
        /// Property name.
        property: String,
        /// Optional chaining.
        optional: bool,
    },
    /// `obj[expr]`
    Index {
        /// Receiver.
        object: Box<Expr>,
        /// Key or index.
        index: Box<Expr>,
        /// Optional chaining.
        optional: bool,
    },
    /// `callee(args)`
    Call {
        /// Function expression.
        callee: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Binary operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Short-circuit operator.
    Logical {
        /// Operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `test ? a : b`
    Conditional {
        /// Condition.
        test: Box<Expr>,
        /// Value when truthy.
        consequent: Box<Expr>,
        /// Value when falsy.
        alternate: Box<Expr>,
    },
    /// Arrow function.
    Arrow(Rc<Lambda>),
    /// `target = value`, `target += value`, ...
    Assign {
        /// Identifier, member or index expression.
        target: Box<Expr>,
        /// Compound operator, if any.
        op: Option<BinaryOp>,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `++x`, `x--`, ...
    Update {
        /// Identifier, member or index expression.
        target: Box<Expr>,
        /// `++` when true.
        increment: bool,
        /// Prefix form when true.
        prefix: bool,
    },
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `let` or `var`
    Let,
    /// `const`
    Const,
}

/// Statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let x = ...`
    Declare {
        /// Keyword.
        kind: DeclKind,
        /// Name.
        name: String,
        /// Initializer.
        init: Option<Expr>,
    },
    /// Expression statement.
    Expr(Expr),
    /// `if (...) ... else ...`
    If {
        /// Condition.
        test: Expr,
        /// Then branch.
        consequent: Box<Stmt>,
        /// Else branch.
        alternate: Option<Box<Stmt>>,
    },
    /// `while (...) ...`
    While {
        /// Condition.
        test: Expr,
        /// Body.
        body: Box<Stmt>,
    },
    /// `for (init; test; update) ...`
    For {
        /// Initializer.
        init: Option<Box<Stmt>>,
        /// Condition.
        test: Option<Expr>,
        /// Update expression.
        update: Option<Expr>,
        /// Body.
        body: Box<Stmt>,
    },
    /// `for (const x of items) ...`
    ForOf {
        /// Loop variable.
        name: String,
        /// Iterated array.
        iterable: Expr,
        /// Body.
        body: Box<Stmt>,
    },
    /// `for (const k in obj) ...`
    ForIn {
        /// Loop variable.
        name: String,
        /// Iterated object.
        object: Expr,
        /// Body.
        body: Box<Stmt>,
    },
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `return ...`
    Return(Option<Expr>),
    /// `throw ...`
    Throw(Expr),
    /// `;`
    Empty,
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top-level statements.
    pub body: Vec<Stmt>,
}
