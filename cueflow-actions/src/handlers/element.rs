//! `setElementProperty`, `toggleVisibility`.

use super::require;
use cueflow_core::address::find_element;
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::model::Element;
use cueflow_core::value::{build_patch, is_truthy};
use cueflow_script::resolve_value;
use serde_json::{Value, json};

fn element(action: &str, reference: &str, ctx: &ExecutionContext) -> Result<Element> {
    find_element(reference, ctx).ok_or_else(|| CueError::ActionFailed {
        action: action.to_string(),
        cause: format!("element '{}' not found", reference),
    })
}

/// Patch one property path on an element.
pub fn set_element_property(
    reference: &str,
    property: &str,
    value: &Value,
    ctx: &ExecutionContext,
) -> Result<()> {
    if property.trim().is_empty() {
        return Err(CueError::invalid_action("setElementProperty", "empty property path"));
    }
    let target = element("setElementProperty", reference, ctx)?;
    let value = require("setElementProperty", value, ctx)?;
    ctx.elements()
        .update_element(&target.id, &build_patch(property, value))
}

/// Set `visible`, or flip it when no value is given. Returns the new state.
pub fn set_visibility(reference: &str, visible: Option<&Value>, ctx: &ExecutionContext) -> Result<bool> {
    let target = element("toggleVisibility", reference, ctx)?;
    let visible = match visible {
        Some(operand) => resolve_value(operand, ctx).is_some_and(|v| is_truthy(&v)),
        None => !target.visible,
    };
    ctx.elements()
        .update_element(&target.id, &json!({"visible": visible}))?;
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::testing::TestHarness;

    fn harness() -> TestHarness {
        TestHarness::builder()
            .element(Element::new("e1", "Bug Logo").with_property("style", json!({"opacity": 1})))
            .state(json!({"fade": 0.25}))
            .build()
    }

    #[test]
    fn property_writes_patch_only_the_path() {
        let h = harness();
        set_element_property("@Bug_Logo", "style.opacity", &json!("state.fade"), &h.ctx).unwrap();
        assert_eq!(
            h.elements.patches(),
            vec![("e1".to_string(), json!({"style": {"opacity": 0.25}}))]
        );
    }

    #[test]
    fn visibility_flips_or_sets() {
        let h = harness();
        assert!(!set_visibility("e1", None, &h.ctx).unwrap());
        assert!(set_visibility("Bug Logo", None, &h.ctx).unwrap());
        assert!(set_visibility("e1", Some(&json!(true)), &h.ctx).unwrap());
    }

    #[test]
    fn missing_element_fails() {
        let h = harness();
        let err = set_visibility("@Nope", None, &h.ctx).unwrap_err();
        assert_eq!(err.code(), "E302");
    }
}
