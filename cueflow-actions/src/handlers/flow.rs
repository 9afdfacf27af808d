//! Navigation, scripts, host functions, waits and log steps.

use super::{require, require_text, write};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::logging::LogCategory;
use cueflow_core::value::{as_f64, to_display_string};
use cueflow_script::{execute_script_async, resolve_value};
use serde_json::Value;

/// Switch to the resolved screen.
pub fn navigate(screen: &Value, ctx: &ExecutionContext) -> Result<()> {
    let screen = require_text("navigate", screen, ctx)?;
    ctx.navigate(&screen)
}

/// Return to the previous screen; no history is not a failure.
pub fn navigate_back(ctx: &ExecutionContext) -> Result<()> {
    if ctx.navigate_back()?.is_none() {
        ctx.debug(LogCategory::Action, "navigateBack with no history");
    }
    Ok(())
}

/// Run a script off the caller's task. Guard failures keep their kind.
pub async fn run_script(script: &str, target: Option<&str>, ctx: &ExecutionContext) -> Result<Value> {
    let value = execute_script_async(script, ctx).await?;
    if let Some(target) = target {
        write("runScript", target, value.clone(), ctx)?;
    }
    Ok(value)
}

/// Call a registered host function with resolved arguments.
pub fn call_function(
    name: &str,
    args: &[Value],
    target: Option<&str>,
    ctx: &ExecutionContext,
) -> Result<Value> {
    let args: Vec<Value> = args
        .iter()
        .map(|arg| resolve_value(arg, ctx).unwrap_or(Value::Null))
        .collect();
    let result = ctx.functions().call(name, &args)?;
    if let Some(target) = target {
        write("callFunction", target, result.clone(), ctx)?;
    }
    Ok(result)
}

/// Suspend for the resolved number of milliseconds.
pub async fn wait(duration: &Value, ctx: &ExecutionContext) -> Result<()> {
    let resolved = require("wait", duration, ctx)?;
    let ms = as_f64(&resolved)
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .ok_or_else(|| CueError::invalid_action("wait", format!("bad duration {}", resolved)))?;
    ctx.delay(ms as u64).await;
    Ok(())
}

/// Write an authored message; `{{...}}` bindings are filled in.
pub fn log(message: &Value, ctx: &ExecutionContext) {
    let text = resolve_value(message, ctx)
        .map(|v| to_display_string(&v))
        .unwrap_or_default();
    ctx.log(text);
}
