//! Evaluation guards: deadlines, loop ceilings, call depth, capabilities.

mod common;

use common::{guarded, scoreboard};
use cueflow_core::error::CueError;
use cueflow_script::{evaluate_expression, execute_script, execute_script_async};
use serde_json::json;
use std::time::{Duration, Instant};

#[test]
fn endless_while_hits_the_loop_ceiling() {
    let harness = guarded(json!({}));
    let started = Instant::now();

    let err = execute_script("while (true) {}", &harness.ctx).unwrap_err();

    assert_eq!(err, CueError::LoopLimitExceeded { limit: 500 });
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn nested_loops_share_one_ceiling() {
    let harness = guarded(json!({}));
    let err = execute_script(
        "let n = 0; for (let i = 0; i < 100; i++) { for (let j = 0; j < 100; j++) { n++ } } n",
        &harness.ctx,
    )
    .unwrap_err();
    assert_eq!(err.code(), "E203");
}

#[test]
fn endless_expression_hits_the_deadline() {
    let harness = guarded(json!({}));
    let started = Instant::now();

    let err = evaluate_expression("[1].map(x => { while (true) {} })", &harness.ctx).unwrap_err();

    assert!(matches!(err, CueError::ScriptTimeout { limit_ms: 20, .. }), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn timeout_and_ceiling_are_told_apart() {
    let harness = guarded(json!({}));
    let timeout = evaluate_expression("[1].map(x => { while (true) {} })", &harness.ctx).unwrap_err();
    let ceiling = execute_script("for (;;) {}", &harness.ctx).unwrap_err();
    assert_ne!(timeout.code(), ceiling.code());
}

#[test]
fn runaway_recursion_hits_call_depth() {
    let harness = guarded(json!({}));
    let err = execute_script("const f = g => g(g); f(f)", &harness.ctx).unwrap_err();
    assert!(matches!(err, CueError::CallDepthExceeded { .. }), "{:?}", err);
}

#[test]
fn host_capabilities_are_unreachable() {
    let harness = guarded(json!({}));
    for source in ["fetch('http://x')", "globalThis", "process.exit()", "[].constructor"] {
        let err = evaluate_expression(source, &harness.ctx).unwrap_err();
        assert_eq!(err.code(), "E205", "{}", source);
    }
}

#[test]
fn failed_scripts_leave_earlier_writes_in_place() {
    let harness = guarded(json!({"n": 0}));
    let err = execute_script("setState('n', 1); throw 'stop'; setState('n', 2)", &harness.ctx)
        .unwrap_err();
    assert_eq!(err.code(), "E204");
    assert_eq!(harness.state("n"), Some(json!(1)));
}

#[tokio::test]
async fn async_scripts_keep_the_ceiling_distinct() {
    let harness = guarded(json!({}));
    let err = execute_script_async("let i = 0; while (i >= 0) { i++ }", &harness.ctx)
        .await
        .unwrap_err();
    assert_eq!(err, CueError::LoopLimitExceeded { limit: 500 });
}

#[test]
fn oversized_helper_strings_fail_before_allocating() {
    let harness = scoreboard(json!({}));
    let started = Instant::now();
    for source in [
        "'x'.padStart(10000, 'x').replaceAll('x', 'x'.padStart(10000, 'x'))",
        "'x'.padStart(2000, 'x').split('').join('y'.padStart(1000, 'y'))",
        "'ab'.repeat(600000)",
        "'x'.padStart(2000000, 'x')",
        "'é'.padEnd(600000, 'é')",
        "concat('x'.padStart(600000, 'x'), 'y'.padStart(600000, 'y'))",
        "'x'.padStart(600000, 'x') + 'y'.padStart(600000, 'y')",
    ] {
        let err = execute_script(source, &harness.ctx).unwrap_err();
        assert_eq!(err.code(), "E204", "{}", source);
        assert!(err.to_string().contains("string longer than"), "{}: {}", source, err);
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn helper_strings_within_the_cap_still_build() {
    let harness = guarded(json!({}));
    let eval = |source| evaluate_expression(source, &harness.ctx).unwrap();
    assert_eq!(eval("'ab'.repeat(3)"), json!("ababab"));
    assert_eq!(eval("'a-b-c'.replaceAll('-', '::')"), json!("a::b::c"));
    assert_eq!(eval("'a-b-c'.replace('-', '+')"), json!("a+b-c"));
    assert_eq!(eval("'7'.padStart(3, '0')"), json!("007"));
    assert_eq!(eval("['a', 'b'].join(', ')"), json!("a, b"));
    assert_eq!(eval("'x'.padStart(1000, 'x').length"), json!(1000));
}
