//! cueflow script engine.
//!
//! A small, sandboxed expression and script language for authored
//! automation:
//! - Lexer and recursive-descent parser producing an AST
//! - Tree-walking interpreter with a closed capability boundary
//! - Execution budget: wall-clock deadline, loop iteration ceiling, call depth
//! - Helper library (`sum`, `avg`, `filter`, `groupBy`, `format`, ...)
//! - `resolve_value` for literal / path / binding / expression / address operands
//! - Condition evaluation and static validation for editor feedback
//!
//! Evaluated code only sees the [`ExecutionContext`] it is handed and the
//! curated helpers. Host capabilities such as timers, network access or
//! global objects are not reachable.
//!
//! [`ExecutionContext`]: cueflow_core::context::ExecutionContext

#![warn(missing_docs)]

pub mod ast;
pub mod budget;
pub mod condition;
pub mod engine;
pub mod helpers;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod validate;

pub use budget::{Budget, ScriptLimits};
pub use condition::{Condition, ConditionOperator, evaluate_condition};
pub use engine::{evaluate_expression, execute_script, execute_script_async, try_evaluate};
pub use resolve::{interpolate, read_path, resolve_value};
pub use validate::{Validator, validate_expression, validate_script};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::budget::{Budget, ScriptLimits};
    pub use crate::condition::{Condition, ConditionOperator, evaluate_condition};
    pub use crate::engine::{
        evaluate_expression, execute_script, execute_script_async, try_evaluate,
    };
    pub use crate::resolve::{interpolate, read_path, resolve_value};
    pub use crate::validate::{Validator, validate_expression, validate_script};
}
