//! Public evaluation entry points.

use crate::budget::ScriptLimits;
use crate::interpreter::{Interpreter, Val};
use crate::parser::{parse_expression, parse_program};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::logging::LogCategory;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Slack added to the outer async timeout so the interpreter's own deadline
/// normally fires first and reports the elapsed time.
const ASYNC_GRACE: Duration = Duration::from_millis(50);

/// Evaluate one expression under the short expression deadline.
///
/// `undefined` results come back as `null`.
pub fn evaluate_expression(expression: &str, ctx: &ExecutionContext) -> Result<Value> {
    let expr = parse_expression(expression)?;
    let mut interpreter = Interpreter::new(ctx, ScriptLimits::for_expression(ctx.settings()));
    let value = interpreter.eval(&expr)?;
    Ok(value.into_json())
}

/// Run a script under the script deadline and the loop iteration ceiling.
///
/// The result is the value of a top-level `return`, or of the last
/// expression statement.
pub fn execute_script(script: &str, ctx: &ExecutionContext) -> Result<Value> {
    let started = Instant::now();
    let program = parse_program(script)?;
    let mut interpreter = Interpreter::new(ctx, ScriptLimits::for_script(ctx.settings()));
    let result = interpreter.run_program(&program).map(Val::into_json);
    tracing::debug!(
        elapsed_us = started.elapsed().as_micros() as u64,
        ok = result.is_ok(),
        "Script finished"
    );
    result
}

/// Run a script on the blocking pool so the caller's task keeps yielding.
///
/// An outer timer backs up the interpreter's own deadline: if the script
/// thread has not answered in time the caller gets a timeout regardless.
pub async fn execute_script_async(script: &str, ctx: &ExecutionContext) -> Result<Value> {
    let limit = ctx.settings().script_timeout();
    let script = script.to_string();
    let task_ctx = ctx.clone();
    let handle = tokio::task::spawn_blocking(move || execute_script(&script, &task_ctx));

    match tokio::time::timeout(limit + ASYNC_GRACE, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(CueError::script(format!(
            "script task failed: {}",
            join_error
        ))),
        Err(_) => Err(CueError::ScriptTimeout {
            elapsed_ms: (limit + ASYNC_GRACE).as_millis() as u64,
            limit_ms: limit.as_millis() as u64,
        }),
    }
}

/// Evaluate an expression, logging failures and returning `None`.
pub fn try_evaluate(expression: &str, ctx: &ExecutionContext) -> Option<Value> {
    match evaluate_expression(expression, ctx) {
        Ok(value) => Some(value),
        Err(e) => {
            ctx.warn(
                LogCategory::Script,
                format!("Expression '{}' failed: {}", expression, e),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::settings::EngineSettings;
    use cueflow_core::testing::TestHarness;
    use serde_json::json;

    #[test]
    fn expression_value() {
        let harness = TestHarness::builder().state(json!({"x": 4})).build();
        assert_eq!(
            evaluate_expression("state.x > 3 ? 'big' : 'small'", &harness.ctx).unwrap(),
            json!("big")
        );
        assert_eq!(
            evaluate_expression("state.missing", &harness.ctx).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn expressions_are_single_expressions() {
        let harness = TestHarness::empty();
        let err = evaluate_expression("let x = 1", &harness.ctx).unwrap_err();
        assert_eq!(err.code(), "E201");
    }

    #[test]
    fn script_completion_value() {
        let harness = TestHarness::empty();
        assert_eq!(
            execute_script("let a = 2\nlet b = 3\na * b", &harness.ctx).unwrap(),
            json!(6)
        );
        assert_eq!(
            execute_script("if (true) { return 'early' }\n'late'", &harness.ctx).unwrap(),
            json!("early")
        );
    }

    #[test]
    fn script_loop_ceiling_comes_from_settings() {
        let harness = TestHarness::builder()
            .settings(EngineSettings::default().with_max_loop_iterations(50))
            .build();
        let err = execute_script("let i = 0; while (true) { i++ }", &harness.ctx).unwrap_err();
        assert_eq!(err, CueError::LoopLimitExceeded { limit: 50 });
    }

    #[test]
    fn try_evaluate_logs_failures() {
        let harness = TestHarness::empty();
        assert_eq!(try_evaluate("nope(", &harness.ctx), None);
        assert_eq!(harness.warnings().len(), 1);
    }

    #[tokio::test]
    async fn async_script_runs_off_the_caller_task() {
        let harness = TestHarness::builder().state(json!({"n": 2})).build();
        let value = execute_script_async("setState('n', state.n * 10); state.n", &harness.ctx)
            .await
            .unwrap();
        assert_eq!(value, json!(20));
        assert_eq!(harness.state("n"), Some(json!(20)));
    }

    #[tokio::test]
    async fn async_script_reports_loop_ceiling() {
        let harness = TestHarness::builder()
            .settings(EngineSettings::default().with_max_loop_iterations(10))
            .build();
        let err = execute_script_async("for (;;) {}", &harness.ctx)
            .await
            .unwrap_err();
        assert_eq!(err, CueError::LoopLimitExceeded { limit: 10 });
    }
}
