//! `resolve_value`: the single entry for operand resolution.
//!
//! Conditions and action arguments both go through here, so a literal, a
//! field path, a `{{binding}}`, an `=expression` or an `@address` behave
//! the same wherever they appear.

use crate::engine::evaluate_expression;
use cueflow_core::address::{AddressKind, SIGIL, find_element, parse_address, resolve_address};
use cueflow_core::context::ExecutionContext;
use cueflow_core::logging::LogCategory;
use cueflow_core::value::{PathSegment, get_by_segments, parse_path, to_display_string};
use serde_json::{Value, json};

/// Names that resolve against the context rather than a local binding.
pub const ROOTS: &[&str] = &["state", "event", "data", "records", "index", "forms"];

/// Value of a root name or context local.
pub(crate) fn root_value(name: &str, ctx: &ExecutionContext) -> Option<Value> {
    if let Some(local) = ctx.local(name) {
        return Some(local.clone());
    }
    match name {
        "state" => Some(ctx.store().snapshot()),
        "event" => Some(ctx.event().to_value()),
        "data" => Some(ctx.data().current_record().cloned().unwrap_or(Value::Null)),
        "records" => Some(Value::Array(ctx.data().active.payload.clone())),
        "index" => Some(json!(ctx.data().active.index)),
        "forms" => Some(ctx.store().forms_snapshot()),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Whether a string is a dotted path rooted at a context name.
fn looks_like_path(s: &str, ctx: &ExecutionContext) -> bool {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return false;
    }
    let root_end = s.find(|c| c == '.' || c == '[').unwrap_or(s.len());
    let root = &s[..root_end];
    if !is_identifier(root) || !(ROOTS.contains(&root) || ctx.local(root).is_some()) {
        return false;
    }
    parse_path(s).iter().all(|segment| match segment {
        PathSegment::Key(key) => !key.is_empty(),
        PathSegment::Index(_) => true,
    })
}

/// Read a path rooted at `state`, `event`, `data`, `records`, `index`,
/// `forms` or a context local.
pub fn read_path(path: &str, ctx: &ExecutionContext) -> Option<Value> {
    let path = path.trim();
    let segments = parse_path(path);
    let (PathSegment::Key(root), rest) = segments.split_first()? else {
        return None;
    };

    // State reads go straight to the store instead of cloning a snapshot
    if root == "state" && ctx.local("state").is_none() {
        if rest.is_empty() {
            return Some(ctx.store().snapshot());
        }
        let key = match &rest[0] {
            PathSegment::Key(key) => key.as_str(),
            PathSegment::Index(_) => return None,
        };
        let value = ctx.store().get(key)?;
        return get_by_segments(&value, &rest[1..]).cloned();
    }

    let base = root_value(root, ctx)?;
    get_by_segments(&base, rest).cloned()
}

fn substitute_state_placeholder(value: Value, ctx: &ExecutionContext) -> Option<Value> {
    let binding = value
        .as_str()
        .and_then(|s| s.strip_prefix("{{"))
        .and_then(|rest| rest.strip_suffix("}}"))
        .filter(|binding| binding.starts_with("state."))
        .map(str::to_string);
    match binding {
        Some(binding) => read_path(&binding, ctx),
        None => Some(value),
    }
}

fn resolve_address_value(address: &str, ctx: &ExecutionContext) -> Option<Value> {
    // `@Score` with no element of that name reads the state variable
    if let Some(parsed) = parse_address(address) {
        if parsed.kind == AddressKind::Element
            && parsed.path.is_empty()
            && find_element(&parsed.name, ctx).is_none()
        {
            if let Some(value) = ctx.store().get(&parsed.name) {
                return Some(value);
            }
        }
    }
    let value = resolve_address(address, ctx)?;
    substitute_state_placeholder(value, ctx)
}

fn resolve_binding(binding: &str, ctx: &ExecutionContext) -> Option<Value> {
    let binding = binding.trim();
    if binding.starts_with(SIGIL) {
        return resolve_address_value(binding, ctx);
    }
    if looks_like_path(binding, ctx) {
        return read_path(binding, ctx);
    }
    match evaluate_expression(binding, ctx) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            ctx.warn(
                LogCategory::Script,
                format!("Binding '{{{{{}}}}}' failed: {}", binding, e),
            );
            None
        }
    }
}

/// Replace every `{{...}}` in a string; unresolved bindings render empty.
pub fn interpolate(template: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        if let Some(value) = resolve_binding(&after[..end], ctx) {
            out.push_str(&to_display_string(&value));
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn resolve_str(source: &str, ctx: &ExecutionContext) -> Option<Value> {
    let trimmed = source.trim();

    if trimmed.starts_with(SIGIL) {
        return resolve_address_value(trimmed, ctx);
    }

    if let Some(inner) = trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        if !inner.contains("{{") && !inner.contains("}}") {
            return resolve_binding(inner, ctx);
        }
    }
    if source.contains("{{") {
        return Some(Value::String(interpolate(source, ctx)));
    }

    if let Some(expression) = trimmed.strip_prefix('=') {
        return match evaluate_expression(expression, ctx) {
            Ok(value) => Some(value),
            Err(e) => {
                ctx.warn(
                    LogCategory::Script,
                    format!("Expression '{}' failed: {}", expression.trim(), e),
                );
                None
            }
        };
    }

    if looks_like_path(trimmed, ctx) {
        return read_path(trimmed, ctx);
    }

    Some(Value::String(source.to_string()))
}

/// Resolve a literal, path, binding, expression or address to its value.
///
/// Never fails: anything that cannot be resolved logs a warning where
/// appropriate and returns `None`.
///
/// Accepted shapes:
/// - non-string JSON: returned as is
/// - `{"literal": v}`, `{"path": "state.x"}`, `{"address": "@A.b"}`,
///   `{"expression": "a + 1"}`
/// - `"@address"`
/// - `"{{path}}"` (typed value) or text with embedded `{{...}}` (string)
/// - `"=expression"`
/// - `"state.x"`, `"event.payload.id"`, `"data.score"`, `"item.name"`
/// - any other string: itself
pub fn resolve_value(source: &Value, ctx: &ExecutionContext) -> Option<Value> {
    match source {
        Value::String(s) => resolve_str(s, ctx),
        Value::Object(map) if map.len() == 1 => {
            let (key, inner) = map.iter().next()?;
            match (key.as_str(), inner) {
                ("literal", v) => Some(v.clone()),
                ("path", Value::String(p)) => read_path(p, ctx),
                ("address", Value::String(a)) => resolve_address_value(a, ctx),
                ("expression", Value::String(e)) => resolve_str(&format!("={}", e), ctx),
                _ => Some(source.clone()),
            }
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::model::{DataScope, Element, TriggerEvent};
    use cueflow_core::testing::TestHarness;

    fn harness() -> TestHarness {
        TestHarness::builder()
            .element(Element::new("e1", "Logo").with_property("opacity", json!(0.5)))
            .state(json!({"Score": 15, "user": {"name": "Ada"}, "count": 3}))
            .data(DataScope::new(vec![json!({"team": "Red"})], 0))
            .event(TriggerEvent::new("click").on_element("e1").with_payload(json!({"id": 7})))
            .build()
    }

    #[test]
    fn literals_pass_through() {
        let h = harness();
        assert_eq!(resolve_value(&json!(42), &h.ctx), Some(json!(42)));
        assert_eq!(resolve_value(&json!("hello"), &h.ctx), Some(json!("hello")));
        assert_eq!(resolve_value(&json!({"literal": "@Logo"}), &h.ctx), Some(json!("@Logo")));
    }

    #[test]
    fn paths_and_bindings_keep_types() {
        let h = harness();
        assert_eq!(resolve_value(&json!("state.count"), &h.ctx), Some(json!(3)));
        assert_eq!(resolve_value(&json!("{{state.user.name}}"), &h.ctx), Some(json!("Ada")));
        assert_eq!(resolve_value(&json!("event.payload.id"), &h.ctx), Some(json!(7)));
        assert_eq!(resolve_value(&json!("data.team"), &h.ctx), Some(json!("Red")));
        assert_eq!(resolve_value(&json!({"path": "state.count"}), &h.ctx), Some(json!(3)));
    }

    #[test]
    fn interpolation_renders_text() {
        let h = harness();
        assert_eq!(
            resolve_value(&json!("Hi {{state.user.name}}, {{state.count}} left{{state.nope}}"), &h.ctx),
            Some(json!("Hi Ada, 3 left"))
        );
    }

    #[test]
    fn expressions() {
        let h = harness();
        assert_eq!(resolve_value(&json!("=state.count * 2"), &h.ctx), Some(json!(6)));
        assert_eq!(resolve_value(&json!({"expression": "1 + 1"}), &h.ctx), Some(json!(2)));
        assert_eq!(resolve_value(&json!("=)("), &h.ctx), None);
        assert_eq!(h.warnings().len(), 1);
    }

    #[test]
    fn addresses_resolve_live() {
        let h = harness();
        assert_eq!(resolve_value(&json!("@Logo.opacity"), &h.ctx), Some(json!(0.5)));
        assert_eq!(resolve_value(&json!("@state.count"), &h.ctx), Some(json!(3)));
        h.ctx.store().set("count", json!(4));
        assert_eq!(resolve_value(&json!("@state.count"), &h.ctx), Some(json!(4)));
    }

    #[test]
    fn bare_element_address_falls_back_to_state() {
        let h = harness();
        assert_eq!(resolve_value(&json!("@Score"), &h.ctx), Some(json!(15)));
        assert!(h.warnings().is_empty());
        assert_eq!(resolve_value(&json!("@Missing"), &h.ctx), None);
        assert_eq!(h.warnings().len(), 1);
    }

    #[test]
    fn locals_are_path_roots() {
        let h = harness();
        let ctx = h.ctx.with_local("item", json!({"label": "x"}));
        assert_eq!(resolve_value(&json!("item.label"), &ctx), Some(json!("x")));
        assert_eq!(resolve_value(&json!("item label"), &ctx), Some(json!("item label")));
    }
}
