//! Per-family action handlers.
//!
//! Handlers return `Err` for anything the report should count as a failure;
//! the executor logs it and moves on to the next action.

pub mod data;
pub mod element;
pub mod flow;
pub mod form;
pub mod playout;
pub mod state;

use cueflow_core::address::{SIGIL, write_target};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_script::resolve_value;
use serde_json::Value;

/// Resolve an operand that must produce a value.
pub(crate) fn require(action: &str, operand: &Value, ctx: &ExecutionContext) -> Result<Value> {
    resolve_value(operand, ctx).ok_or_else(|| CueError::ActionFailed {
        action: action.to_string(),
        cause: format!("operand {} did not resolve", operand),
    })
}

/// Resolve an operand that must produce text.
pub(crate) fn require_text(action: &str, operand: &Value, ctx: &ExecutionContext) -> Result<String> {
    match require(action, operand, ctx)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CueError::invalid_action(
            action,
            format!("expected text, got {}", other),
        )),
    }
}

/// Current value of an assignment target.
pub(crate) fn read_target(target: &str, ctx: &ExecutionContext) -> Option<Value> {
    let target = target.trim();
    if target.starts_with(SIGIL) {
        return resolve_value(&Value::String(target.to_string()), ctx);
    }
    let path = target.strip_prefix("state.").unwrap_or(target);
    ctx.store().get_path(path)
}

/// Write an assignment target, turning a refused write into a failure.
pub(crate) fn write(action: &str, target: &str, value: Value, ctx: &ExecutionContext) -> Result<()> {
    if write_target(target, value, ctx) {
        Ok(())
    } else {
        Err(CueError::ActionFailed {
            action: action.to_string(),
            cause: format!("could not write '{}'", target),
        })
    }
}
