//! `setState`, `toggleState`, `incrementState`.

use super::{read_target, require, write};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::value::{as_f64, is_truthy, number};
use serde_json::Value;

/// Write the resolved value to the target.
pub fn set_state(target: &str, value: &Value, ctx: &ExecutionContext) -> Result<()> {
    let value = require("setState", value, ctx)?;
    write("setState", target, value, ctx)
}

/// Flip the target's truthiness. Returns the new value.
pub fn toggle_state(target: &str, ctx: &ExecutionContext) -> Result<bool> {
    let current = read_target(target, ctx).is_some_and(|v| is_truthy(&v));
    write("toggleState", target, Value::Bool(!current), ctx)?;
    Ok(!current)
}

/// Add `by` to the target. A missing target starts from zero; anything
/// other than a number (numeric text included) is left alone and fails.
pub fn increment_state(target: &str, by: &Value, ctx: &ExecutionContext) -> Result<f64> {
    let step = require("incrementState", by, ctx)?;
    let step = as_f64(&step).ok_or_else(|| {
        CueError::invalid_action("incrementState", format!("step {} is not a number", step))
    })?;

    if let Some(key) = top_level_key(target) {
        return ctx.store().increment(key, step).map_err(|e| CueError::ActionFailed {
            action: "incrementState".to_string(),
            cause: e.to_string(),
        });
    }

    let current = match read_target(target, ctx) {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(value) => {
            return Err(CueError::ActionFailed {
                action: "incrementState".to_string(),
                cause: format!("'{}' holds non-numeric {}", target, value),
            });
        }
    };

    let next = current + step;
    write("incrementState", target, number(next), ctx)?;
    Ok(next)
}

/// `count`, `state.count` or `@state.count`: a key the store can bump in place.
fn top_level_key(target: &str) -> Option<&str> {
    let target = target.trim();
    let key = target
        .strip_prefix("@state.")
        .or_else(|| target.strip_prefix("state."))
        .unwrap_or(target);
    (!key.is_empty() && !key.contains('.') && !key.starts_with('@')).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::model::Element;
    use cueflow_core::testing::TestHarness;
    use serde_json::json;

    #[test]
    fn set_state_resolves_operands() {
        let harness = TestHarness::builder().state(json!({"a": 2})).build();
        set_state("b", &json!("=state.a * 3"), &harness.ctx).unwrap();
        set_state("state.nested.c", &json!("@state.a"), &harness.ctx).unwrap();
        assert_eq!(harness.state("b"), Some(json!(6)));
        assert_eq!(harness.state("nested"), Some(json!({"c": 2})));
    }

    #[test]
    fn set_state_can_target_elements() {
        let harness = TestHarness::builder()
            .element(Element::new("e1", "Title").with_property("content", json!({"text": ""})))
            .build();
        set_state("@Title.content.text", &json!("Live"), &harness.ctx).unwrap();
        assert_eq!(
            harness.elements.patches(),
            vec![("e1".to_string(), json!({"content": {"text": "Live"}}))]
        );
    }

    #[test]
    fn unresolved_value_fails() {
        let harness = TestHarness::empty();
        let err = set_state("x", &json!("@Missing.text"), &harness.ctx).unwrap_err();
        assert_eq!(err.code(), "E302");
        assert_eq!(harness.state("x"), None);
    }

    #[test]
    fn toggle_and_increment() {
        let harness = TestHarness::builder().state(json!({"on": false, "n": 1, "s": "x"})).build();
        assert!(toggle_state("on", &harness.ctx).unwrap());
        assert!(toggle_state("fresh", &harness.ctx).unwrap());
        assert_eq!(increment_state("n", &json!(2), &harness.ctx).unwrap(), 3.0);
        assert_eq!(increment_state("new", &json!("1.5"), &harness.ctx).unwrap(), 1.5);
        assert!(increment_state("s", &json!(1), &harness.ctx).is_err());
        assert_eq!(harness.state("s"), Some(json!("x")));
    }

    #[test]
    fn numeric_text_is_not_incremented() {
        let harness = TestHarness::builder()
            .state(json!({"count": "5", "score": {"home": "2"}}))
            .build();
        for target in ["count", "state.count", "@state.count", "score.home"] {
            let err = increment_state(target, &json!(1), &harness.ctx).unwrap_err();
            assert_eq!(err.code(), "E302", "{}", target);
        }
        assert_eq!(harness.state("count"), Some(json!("5")));
        assert_eq!(harness.state("score"), Some(json!({"home": "2"})));

        assert_eq!(increment_state("@state.fresh", &json!(2), &harness.ctx).unwrap(), 2.0);
        assert_eq!(harness.state("fresh"), Some(json!(2)));
    }
}
